//! One-time setup and teardown of the media environment and its transform.

use super::transform::{MediaSubsystem, Startup, StreamIds, Transform, TransformError};

/// Owns the media subsystem and the single transform created from it.
///
/// Setup happens once in [`TransformSession::new`]. A failure anywhere
/// leaves the session invalid for the rest of its life. Teardown runs in
/// reverse on drop, skipping steps whose setup never succeeded.
pub struct TransformSession<S: MediaSubsystem> {
    subsystem: S,
    transform: Option<S::Transform>,
    stream_ids: StreamIds,
    env_ready: bool,
    started: bool,
}

impl<S: MediaSubsystem> TransformSession<S> {
    pub fn new(subsystem: S) -> Self {
        let mut session = Self {
            subsystem,
            transform: None,
            stream_ids: StreamIds::default(),
            env_ready: false,
            started: false,
        };

        match session.subsystem.init_environment() {
            Ok(Startup::Initialized) => {}
            Ok(Startup::AlreadyInitialized) => {
                log::debug!("Media environment already initialized");
            }
            Err(e) => {
                log::error!("Failed to initialize media environment: {}", e);
                return session;
            }
        }
        session.env_ready = true;

        if let Err(e) = session.subsystem.startup() {
            log::error!("Failed to start media subsystem: {}", e);
            return session;
        }
        session.started = true;
        log::info!("Media subsystem activated");

        let mut transform = match session.subsystem.create_transform() {
            Ok(transform) => transform,
            Err(e) => {
                log::error!("Can't initialize decoder: {}", e);
                return session;
            }
        };

        session.stream_ids = match transform.stream_ids() {
            Ok(ids) => ids,
            // The transform does not assign stream ids; both default to 0.
            Err(TransformError::NotImplemented) => StreamIds::default(),
            Err(e) => {
                log::error!("Decoder failed to initialize the stream ID: {}", e);
                return session;
            }
        };

        session.transform = Some(transform);
        session
    }

    pub fn is_valid(&self) -> bool {
        self.transform.is_some()
    }

    pub fn stream_ids(&self) -> StreamIds {
        self.stream_ids
    }

    pub fn transform(&mut self) -> Option<&mut S::Transform> {
        self.transform.as_mut()
    }
}

impl<S: MediaSubsystem> Drop for TransformSession<S> {
    fn drop(&mut self) {
        if let Some(mut transform) = self.transform.take() {
            if let Err(e) = transform.flush() {
                log::warn!("Failed to flush decoder on teardown: {}", e);
            }
            // The transform must be gone before the subsystem shuts down.
            drop(transform);
        }
        if self.started {
            self.subsystem.shutdown();
        }
        if self.env_ready {
            self.subsystem.release_environment();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{FakeSubsystem, Failure};

    #[test]
    fn setup_and_teardown_order() {
        let fake = FakeSubsystem::new();
        let events = fake.events();
        let session = TransformSession::new(fake);
        assert!(session.is_valid());
        drop(session);
        assert_eq!(
            *events.borrow(),
            vec![
                "init_environment",
                "startup",
                "create_transform",
                "stream_ids",
                "flush",
                "drop_transform",
                "shutdown",
                "release_environment",
            ]
        );
    }

    #[test]
    fn already_initialized_environment_is_success() {
        let fake = FakeSubsystem::new().already_initialized();
        let session = TransformSession::new(fake);
        assert!(session.is_valid());
    }

    #[test]
    fn unassigned_stream_ids_default_to_zero() {
        let fake = FakeSubsystem::new().with_stream_ids(Err(TransformError::NotImplemented));
        let session = TransformSession::new(fake);
        assert!(session.is_valid());
        assert_eq!(session.stream_ids(), StreamIds { input: 0, output: 0 });
    }

    #[test]
    fn assigned_stream_ids_are_kept() {
        let fake = FakeSubsystem::new().with_stream_ids(Ok(StreamIds { input: 3, output: 4 }));
        let session = TransformSession::new(fake);
        assert_eq!(session.stream_ids(), StreamIds { input: 3, output: 4 });
    }

    #[test]
    fn stream_id_failure_invalidates() {
        let fake = FakeSubsystem::new()
            .with_stream_ids(Err(TransformError::Backend("boom".into())));
        let events = fake.events();
        let session = TransformSession::new(fake);
        assert!(!session.is_valid());
        drop(session);
        // Transform was created and dropped without a flush.
        let events = events.borrow();
        assert!(!events.contains(&"flush"));
        assert!(events.contains(&"drop_transform"));
        assert!(events.ends_with(&["shutdown", "release_environment"]));
    }

    #[test]
    fn startup_failure_skips_shutdown() {
        let fake = FakeSubsystem::new().failing(Failure::Startup);
        let events = fake.events();
        let session = TransformSession::new(fake);
        assert!(!session.is_valid());
        drop(session);
        assert_eq!(
            *events.borrow(),
            vec!["init_environment", "startup", "release_environment"]
        );
    }

    #[test]
    fn environment_failure_tears_down_nothing() {
        let fake = FakeSubsystem::new().failing(Failure::Environment);
        let events = fake.events();
        let session = TransformSession::new(fake);
        assert!(!session.is_valid());
        drop(session);
        assert_eq!(*events.borrow(), vec!["init_environment"]);
    }

    #[test]
    fn transform_creation_failure_invalidates() {
        let fake = FakeSubsystem::new().failing(Failure::CreateTransform);
        let events = fake.events();
        drop(TransformSession::new(fake));
        assert_eq!(
            *events.borrow(),
            vec![
                "init_environment",
                "startup",
                "create_transform",
                "shutdown",
                "release_environment",
            ]
        );
    }
}
