//! Linux Platform Backend - PulseAudio
//!
//! Provides blocking access to a PulseAudio (or pipewire-pulse) server:
//! - Sink and sink input enumeration
//! - Volume and mute changes
//! - Stream routing and default sink selection
//!
//! # Architecture
//!
//! The client library is asynchronous and callback driven. Each session
//! runs a threaded mainloop; the calling thread submits one request at a
//! time under the mainloop lock and waits for the completion signal:
//!
//! ```text
//! Calling Thread                  Mainloop Thread
//! ──────────────                  ───────────────
//! PulseSession
//!   ├── lock + submit ─────────►  request dispatch
//!   ├── wait ◄───────────────────  callback: store result, signal
//!   └── unlock, read result
//! ```

#[cfg(all(target_os = "linux", feature = "pulse"))]
mod session;

#[cfg(all(target_os = "linux", feature = "pulse"))]
pub use session::PulseSession;

use crate::config::ClientConfig;
use crate::error::MixerResult;
use crate::traits::Connector;

#[cfg(not(all(target_os = "linux", feature = "pulse")))]
use crate::error::MixerError;
#[cfg(not(all(target_os = "linux", feature = "pulse")))]
use crate::traits::MixerBackend;
#[cfg(not(all(target_os = "linux", feature = "pulse")))]
use crate::types::{ServerInfo, SinkEntry, SinkInputEntry, Target};

/// Opens PulseAudio sessions
///
/// Without an explicit configuration the environment is read on every
/// connect, so changes apply to the next session.
#[derive(Debug, Clone, Default)]
pub struct PulseConnector {
    config: Option<ClientConfig>,
}

impl PulseConnector {
    /// Connector reading its configuration from the environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector with a fixed configuration
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    fn config(&self) -> ClientConfig {
        self.config.clone().unwrap_or_else(ClientConfig::from_env)
    }
}

#[cfg(all(target_os = "linux", feature = "pulse"))]
impl Connector for PulseConnector {
    type Backend = PulseSession;

    fn connect(&self) -> MixerResult<PulseSession> {
        PulseSession::open(&self.config())
    }
}

#[cfg(not(all(target_os = "linux", feature = "pulse")))]
impl Connector for PulseConnector {
    type Backend = StubSession;

    fn connect(&self) -> MixerResult<StubSession> {
        self.config().validate()?;
        Err(MixerError::FeatureNotAvailable(
            "PulseAudio feature not enabled".into(),
        ))
    }
}

/// Stub session for when the PulseAudio feature is disabled
///
/// Never handed out by [`PulseConnector`]; every request fails.
#[cfg(not(all(target_os = "linux", feature = "pulse")))]
#[derive(Debug)]
pub struct StubSession;

#[cfg(not(all(target_os = "linux", feature = "pulse")))]
impl StubSession {
    fn unavailable<T>() -> MixerResult<T> {
        Err(MixerError::FeatureNotAvailable(
            "PulseAudio feature not enabled".into(),
        ))
    }
}

#[cfg(not(all(target_os = "linux", feature = "pulse")))]
impl MixerBackend for StubSession {
    fn name(&self) -> &'static str {
        "PulseAudio Stub (feature disabled)"
    }

    fn server_info(&mut self) -> MixerResult<ServerInfo> {
        Self::unavailable()
    }

    fn sinks(&mut self) -> MixerResult<Vec<SinkEntry>> {
        Self::unavailable()
    }

    fn sink_inputs(&mut self) -> MixerResult<Vec<SinkInputEntry>> {
        Self::unavailable()
    }

    fn set_mute(&mut self, _target: Target, _index: u32, _mute: bool) -> MixerResult<bool> {
        Self::unavailable()
    }

    fn set_volume(&mut self, _target: Target, _index: u32, _volume_db: f64) -> MixerResult<bool> {
        Self::unavailable()
    }

    fn move_sink_input(&mut self, _sink_input: u32, _sink: u32) -> MixerResult<bool> {
        Self::unavailable()
    }

    fn set_default_sink(&mut self, _name: &str) -> MixerResult<bool> {
        Self::unavailable()
    }
}
