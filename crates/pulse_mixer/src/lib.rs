//! Pulse Mixer - Blocking PulseAudio Mixer Control
//!
//! This crate provides a synchronous facade over the PulseAudio client
//! library for:
//! - Sink (output device) and sink input (playback stream) enumeration
//! - Volume and mute changes on a linear 0-100 scale
//! - Moving streams between sinks and changing the default sink
//!
//! # Architecture
//!
//! ```text
//! mixer::* operations ──► MixerBackend ──► PulseSession ──► submit_and_wait
//!        (records)          (trait)       (one per call)    (lock/wait/signal)
//! ```
//!
//! Each operation is written once against the `MixerBackend` trait; a
//! `Connector` opens one backend session per call and the session is
//! closed when dropped.

mod bridge;
mod config;
mod error;
pub mod mixer;
mod pulse;
mod traits;
mod types;
pub mod volume;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use bridge::{submit_and_wait, LoopControl, LoopLock, PendingOperation};
pub use config::{ClientConfig, ENV_CLIENT_NAME, ENV_SERVER};
pub use error::{MixerError, MixerResult};
pub use pulse::PulseConnector;
pub use traits::{Connector, MixerBackend};
pub use types::{
    ListCollector, ListItem, ServerInfo, Sink, SinkEntry, SinkInput, SinkInputEntry, Target,
    VolumeRequest,
};

#[cfg(all(target_os = "linux", feature = "pulse"))]
pub use pulse::PulseSession;

#[cfg(any(test, feature = "memory"))]
pub use memory::{MemoryConnector, MemoryServer, MemorySession};

/// Get the connector for the live audio server
///
/// Sessions read their configuration from the environment.
pub fn get_connector() -> PulseConnector {
    PulseConnector::new()
}

/// Check if this build can talk to a live PulseAudio server
pub fn supports_pulse() -> bool {
    cfg!(all(target_os = "linux", feature = "pulse"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        let _config = ClientConfig::default();
        let _connector = get_connector();
        let _ = supports_pulse();
    }
}
