//! In-Memory Mixer Backend
//!
//! Emulates the slice of server behavior the mixer operations rely on:
//! sinks and sink inputs with decibel volumes, a default sink, and `false`
//! outcomes for unknown indices. Every request is logged so callers can
//! check exactly what was issued.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use tracing::debug;

use crate::error::{MixerError, MixerResult};
use crate::traits::{Connector, MixerBackend};
use crate::types::{ServerInfo, SinkEntry, SinkInputEntry, Target};

/// A request as received by the in-memory server
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ServerInfo,
    ListSinks,
    ListSinkInputs,
    SetMute { target: Target, index: u32, mute: bool },
    SetVolume { target: Target, index: u32, volume_db: f64 },
    MoveSinkInput { sink_input: u32, sink: u32 },
    SetDefaultSink { name: String },
}

/// Server state shared by every session opened from one connector
#[derive(Debug, Default)]
pub struct MemoryServer {
    sinks: BTreeMap<u32, SinkEntry>,
    sink_inputs: BTreeMap<u32, SinkInputEntry>,
    default_sink: Option<String>,
    /// Sink inputs whose mute requests are declined
    declined_mutes: HashSet<u32>,
    requests: Vec<Request>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, index: u32, name: &str, volume_db: f64, mute: bool) {
        self.sinks.insert(
            index,
            SinkEntry {
                index,
                name: name.to_string(),
                volume_db,
                mute,
            },
        );
    }

    pub fn add_sink_input(&mut self, entry: SinkInputEntry) {
        self.sink_inputs.insert(entry.index, entry);
    }

    pub fn set_default_sink_name(&mut self, name: Option<&str>) {
        self.default_sink = name.map(str::to_string);
    }

    /// Make the server decline mute requests for this sink input
    pub fn decline_mute(&mut self, sink_input: u32) {
        self.declined_mutes.insert(sink_input);
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    fn log(&mut self, request: Request) {
        debug!("Memory server request: {:?}", request);
        self.requests.push(request);
    }
}

/// Opens sessions against a shared [`MemoryServer`]
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    server: Rc<RefCell<MemoryServer>>,
    reachable: bool,
    open_sessions: Rc<RefCell<usize>>,
}

impl MemoryConnector {
    pub fn new(server: MemoryServer) -> Self {
        Self {
            server: Rc::new(RefCell::new(server)),
            reachable: true,
            open_sessions: Rc::new(RefCell::new(0)),
        }
    }

    /// A connector whose sessions always fail to connect
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new(MemoryServer::new())
        }
    }

    /// All requests received so far, in order
    pub fn requests(&self) -> Vec<Request> {
        self.server.borrow().requests().to_vec()
    }

    /// Number of sessions not yet closed
    pub fn open_sessions(&self) -> usize {
        *self.open_sessions.borrow()
    }
}

impl Connector for MemoryConnector {
    type Backend = MemorySession;

    fn connect(&self) -> MixerResult<MemorySession> {
        if !self.reachable {
            return Err(MixerError::ConnectionFailed(
                "memory server unreachable".into(),
            ));
        }
        *self.open_sessions.borrow_mut() += 1;
        Ok(MemorySession {
            server: Rc::clone(&self.server),
            open_sessions: Rc::clone(&self.open_sessions),
        })
    }
}

/// One session against a [`MemoryServer`]
#[derive(Debug)]
pub struct MemorySession {
    server: Rc<RefCell<MemoryServer>>,
    open_sessions: Rc<RefCell<usize>>,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut open = self.open_sessions.borrow_mut();
        *open = open.saturating_sub(1);
    }
}

impl MixerBackend for MemorySession {
    fn name(&self) -> &'static str {
        "Memory"
    }

    fn server_info(&mut self) -> MixerResult<ServerInfo> {
        let mut server = self.server.borrow_mut();
        server.log(Request::ServerInfo);
        Ok(ServerInfo {
            default_sink: server.default_sink.clone(),
        })
    }

    fn sinks(&mut self) -> MixerResult<Vec<SinkEntry>> {
        let mut server = self.server.borrow_mut();
        server.log(Request::ListSinks);
        Ok(server.sinks.values().cloned().collect())
    }

    fn sink_inputs(&mut self) -> MixerResult<Vec<SinkInputEntry>> {
        let mut server = self.server.borrow_mut();
        server.log(Request::ListSinkInputs);
        Ok(server.sink_inputs.values().cloned().collect())
    }

    fn set_mute(&mut self, target: Target, index: u32, mute: bool) -> MixerResult<bool> {
        let mut server = self.server.borrow_mut();
        server.log(Request::SetMute {
            target,
            index,
            mute,
        });
        let ok = match target {
            Target::Sink => match server.sinks.get_mut(&index) {
                Some(sink) => {
                    sink.mute = mute;
                    true
                }
                None => false,
            },
            Target::SinkInput => {
                if server.declined_mutes.contains(&index) {
                    false
                } else {
                    match server.sink_inputs.get_mut(&index) {
                        Some(input) => {
                            input.mute = mute;
                            true
                        }
                        None => false,
                    }
                }
            }
        };
        Ok(ok)
    }

    fn set_volume(&mut self, target: Target, index: u32, volume_db: f64) -> MixerResult<bool> {
        let mut server = self.server.borrow_mut();
        server.log(Request::SetVolume {
            target,
            index,
            volume_db,
        });
        let slot = match target {
            Target::Sink => server.sinks.get_mut(&index).map(|s| &mut s.volume_db),
            Target::SinkInput => server.sink_inputs.get_mut(&index).map(|i| &mut i.volume_db),
        };
        Ok(match slot {
            Some(volume) => {
                *volume = volume_db;
                true
            }
            None => false,
        })
    }

    fn move_sink_input(&mut self, sink_input: u32, sink: u32) -> MixerResult<bool> {
        let mut server = self.server.borrow_mut();
        server.log(Request::MoveSinkInput { sink_input, sink });
        if !server.sinks.contains_key(&sink) {
            return Ok(false);
        }
        Ok(match server.sink_inputs.get_mut(&sink_input) {
            Some(input) => {
                input.sink = sink;
                true
            }
            None => false,
        })
    }

    fn set_default_sink(&mut self, name: &str) -> MixerResult<bool> {
        let mut server = self.server.borrow_mut();
        server.log(Request::SetDefaultSink {
            name: name.to_string(),
        });
        if !server.sinks.values().any(|s| s.name == name) {
            return Ok(false);
        }
        server.default_sink = Some(name.to_string());
        Ok(true)
    }
}
