//! Mixer Backend Traits
//!
//! Defines the request surface a connected session must provide. Every
//! method is one blocking request/response round trip.

use crate::error::MixerResult;
use crate::types::{ServerInfo, SinkEntry, SinkInputEntry, Target};

/// Requests a connected mixer session can issue
///
/// Methods return `Ok(false)` when the server declines a request and
/// reserve `Err` for failures to issue it at all.
pub trait MixerBackend {
    /// Get the name of this backend (e.g., "PulseAudio")
    fn name(&self) -> &'static str;

    /// Query server information, including the default sink name
    fn server_info(&mut self) -> MixerResult<ServerInfo>;

    /// List all sinks
    fn sinks(&mut self) -> MixerResult<Vec<SinkEntry>>;

    /// List all sink inputs
    fn sink_inputs(&mut self) -> MixerResult<Vec<SinkInputEntry>>;

    /// Set the mute flag of a sink or sink input
    fn set_mute(&mut self, target: Target, index: u32, mute: bool) -> MixerResult<bool>;

    /// Set the volume of a sink or sink input, in decibels
    fn set_volume(&mut self, target: Target, index: u32, volume_db: f64) -> MixerResult<bool>;

    /// Move a sink input to another sink
    fn move_sink_input(&mut self, sink_input: u32, sink: u32) -> MixerResult<bool>;

    /// Make the named sink the default
    fn set_default_sink(&mut self, name: &str) -> MixerResult<bool>;
}

/// Opens mixer sessions
///
/// Each exposed operation opens exactly one session and drops it before
/// returning; nothing is shared between sessions.
pub trait Connector {
    type Backend: MixerBackend;

    /// Open a new session, blocking until it is ready or has failed
    fn connect(&self) -> MixerResult<Self::Backend>;
}
