//! Scriptable media subsystem and transform used by the unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::transform::{
    InputMediaType, InputSample, InputStatus, MediaSubsystem, OutputMediaType, OutputStatus,
    Startup, StreamIds, Transform, TransformError, TransformResult,
};

pub(crate) type Events = Rc<RefCell<Vec<&'static str>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    Environment,
    Startup,
    CreateTransform,
}

/// What the fake transform saw and what it will answer next.
#[derive(Default)]
pub(crate) struct Script {
    pub inputs: VecDeque<InputStatus>,
    pub outputs: VecDeque<(OutputStatus, Option<Vec<f32>>)>,
    pub submitted: Vec<InputSample>,
    pub input_types: Vec<InputMediaType>,
    pub output_type_calls: usize,
    pub begin_streaming_calls: usize,
    pub receive_calls: usize,
    pub flush_calls: usize,
}

impl Script {
    pub fn input(&mut self, status: InputStatus) -> &mut Self {
        self.inputs.push_back(status);
        self
    }

    pub fn output(&mut self, status: OutputStatus, samples: Option<Vec<f32>>) -> &mut Self {
        self.outputs.push_back((status, samples));
        self
    }
}

pub(crate) struct FakeSubsystem {
    events: Events,
    script: Rc<RefCell<Script>>,
    startup: Startup,
    stream_ids: TransformResult<StreamIds>,
    failure: Option<Failure>,
}

impl FakeSubsystem {
    pub fn new() -> Self {
        Self {
            events: Rc::default(),
            script: Rc::default(),
            startup: Startup::Initialized,
            stream_ids: Err(TransformError::NotImplemented),
            failure: None,
        }
    }

    pub fn already_initialized(mut self) -> Self {
        self.startup = Startup::AlreadyInitialized;
        self
    }

    pub fn with_stream_ids(mut self, ids: TransformResult<StreamIds>) -> Self {
        self.stream_ids = ids;
        self
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn events(&self) -> Events {
        self.events.clone()
    }

    pub fn script(&self) -> Rc<RefCell<Script>> {
        self.script.clone()
    }

    fn fail(&self, failure: Failure) -> TransformResult<()> {
        if self.failure == Some(failure) {
            return Err(TransformError::Backend(format!("{:?} failed", failure)));
        }
        Ok(())
    }
}

impl MediaSubsystem for FakeSubsystem {
    type Transform = FakeTransform;

    fn init_environment(&mut self) -> TransformResult<Startup> {
        self.events.borrow_mut().push("init_environment");
        self.fail(Failure::Environment)?;
        Ok(self.startup)
    }

    fn startup(&mut self) -> TransformResult<()> {
        self.events.borrow_mut().push("startup");
        self.fail(Failure::Startup)
    }

    fn create_transform(&mut self) -> TransformResult<FakeTransform> {
        self.events.borrow_mut().push("create_transform");
        self.fail(Failure::CreateTransform)?;
        Ok(FakeTransform {
            events: self.events.clone(),
            script: self.script.clone(),
            stream_ids: self.stream_ids.clone(),
        })
    }

    fn shutdown(&mut self) {
        self.events.borrow_mut().push("shutdown");
    }

    fn release_environment(&mut self) {
        self.events.borrow_mut().push("release_environment");
    }
}

pub(crate) struct FakeTransform {
    events: Events,
    script: Rc<RefCell<Script>>,
    stream_ids: TransformResult<StreamIds>,
}

impl Transform for FakeTransform {
    fn stream_ids(&mut self) -> TransformResult<StreamIds> {
        self.events.borrow_mut().push("stream_ids");
        self.stream_ids.clone()
    }

    fn set_input_type(&mut self, _stream: u32, media: &InputMediaType) -> TransformResult<()> {
        self.script.borrow_mut().input_types.push(*media);
        Ok(())
    }

    fn set_output_type(&mut self, _stream: u32, _media: OutputMediaType) -> TransformResult<()> {
        self.script.borrow_mut().output_type_calls += 1;
        Ok(())
    }

    fn begin_streaming(&mut self) -> TransformResult<()> {
        self.script.borrow_mut().begin_streaming_calls += 1;
        Ok(())
    }

    fn submit(&mut self, _stream: u32, sample: &InputSample) -> InputStatus {
        let mut script = self.script.borrow_mut();
        script.submitted.push(sample.clone());
        script.inputs.pop_front().unwrap_or(InputStatus::Ok)
    }

    fn receive(&mut self, _stream: u32) -> (OutputStatus, Option<Vec<f32>>) {
        let mut script = self.script.borrow_mut();
        script.receive_calls += 1;
        script
            .outputs
            .pop_front()
            .unwrap_or((OutputStatus::NeedMoreInput, None))
    }

    fn flush(&mut self) -> TransformResult<()> {
        self.events.borrow_mut().push("flush");
        self.script.borrow_mut().flush_calls += 1;
        Ok(())
    }
}

impl Drop for FakeTransform {
    fn drop(&mut self) {
        self.events.borrow_mut().push("drop_transform");
    }
}
