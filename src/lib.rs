//! HLE implementation of the DSP AAC decoder.
//!
//! Guest software talks to the DSP through 32-byte binary messages; the
//! [`audio::DspDecoder`] implementations answer them, reading compressed
//! frames from and writing PCM into guest FCRAM.

pub mod audio;
pub mod config;
pub mod memory;
pub mod protocol;
