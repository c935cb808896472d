//! PulseAudio Session
//!
//! One threaded mainloop plus one context, alive for a single exposed call.
//! Every request goes through [`submit_and_wait`]; callbacks store their
//! result in shared cells and signal the mainloop.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use libpulse_binding as pulse;
use pulse::callbacks::ListResult;
use pulse::context::introspect::{SinkInfo, SinkInputInfo};
use pulse::context::{Context, FlagSet as ContextFlagSet, State as ContextState};
use pulse::mainloop::threaded::Mainloop;
use pulse::operation::{Operation, State as OperationState};
use pulse::volume::{ChannelVolumes, Volume, VolumeDB};
use tracing::{debug, warn};

use crate::bridge::{submit_and_wait, LoopControl, LoopLock, PendingOperation};
use crate::config::ClientConfig;
use crate::error::{MixerError, MixerResult};
use crate::traits::MixerBackend;
use crate::types::{
    ListCollector, ListItem, ServerInfo, SinkEntry, SinkInputEntry, Target,
    PROP_APPLICATION_NAME, PROP_PROCESS_BINARY, PROP_PROCESS_ID,
};

type SharedMainloop = Rc<RefCell<Mainloop>>;

impl LoopControl for RefCell<Mainloop> {
    fn lock(&self) {
        self.borrow_mut().lock();
    }

    fn unlock(&self) {
        self.borrow_mut().unlock();
    }

    fn wait(&self) {
        self.borrow_mut().wait();
    }
}

impl<G: ?Sized + 'static> PendingOperation for Operation<G> {
    fn is_running(&self) -> bool {
        self.get_state() == OperationState::Running
    }
}

/// Wake the thread blocked in `wait`
///
/// Called from callbacks on the mainloop thread.
fn signal(mainloop: &SharedMainloop) {
    // SAFETY: callbacks run on the mainloop thread with the loop lock held,
    // while the calling thread is parked in `wait` and not using the mainloop.
    unsafe { (*mainloop.as_ptr()).signal(false) }
}

/// Context state callback that wakes the calling thread on terminal states
///
/// Stays installed for the whole session: when the connection dies,
/// pending operations are cancelled without running their callbacks, so
/// this is the only signal a parked caller gets.
fn state_callback(
    context: Weak<RefCell<Context>>,
    mainloop: SharedMainloop,
) -> Box<dyn FnMut() + 'static> {
    Box::new(move || {
        let Some(context) = context.upgrade() else {
            return;
        };
        // SAFETY: runs on the mainloop thread under the loop lock; the
        // calling thread only touches the context under that lock.
        let state = unsafe { (*context.as_ptr()).get_state() };
        if is_terminal(state) {
            signal(&mainloop);
        }
    })
}

/// Refuse to submit on a context that is no longer ready
///
/// Must be called under the loop lock, right before submitting.
fn check_ready(context: &RefCell<Context>) -> MixerResult<()> {
    let state = context.borrow().get_state();
    if state == ContextState::Ready {
        Ok(())
    } else {
        Err(MixerError::OperationFailed(format!(
            "connection to the server was lost (context state {:?})",
            state
        )))
    }
}

fn is_terminal(state: ContextState) -> bool {
    matches!(
        state,
        ContextState::Ready | ContextState::Failed | ContextState::Terminated
    )
}

fn list_item<I, T>(result: ListResult<I>, map: impl FnOnce(I) -> T) -> ListItem<T> {
    match result {
        ListResult::Item(info) => ListItem::Item(map(info)),
        ListResult::End => ListItem::End,
        ListResult::Error => ListItem::Error,
    }
}

fn sink_entry(info: &SinkInfo) -> SinkEntry {
    SinkEntry {
        index: info.index,
        name: info
            .name
            .as_ref()
            .map(|n| n.to_string())
            .unwrap_or_default(),
        volume_db: VolumeDB::from(info.volume.avg()).0,
        mute: info.mute,
    }
}

fn sink_input_entry(info: &SinkInputInfo) -> SinkInputEntry {
    SinkInputEntry {
        index: info.index,
        sink: info.sink,
        name: info.name.as_ref().map(|n| n.to_string()),
        volume_db: VolumeDB::from(info.volume.avg()).0,
        mute: info.mute,
        application_name: info.proplist.get_str(PROP_APPLICATION_NAME),
        process_id: info.proplist.get_str(PROP_PROCESS_ID),
        process_binary: info.proplist.get_str(PROP_PROCESS_BINARY),
    }
}

/// Single-channel volume set to the software volume of `volume_db`
///
/// The server applies a one-channel volume to every channel.
fn mono_volume(volume_db: f64) -> ChannelVolumes {
    let mut volumes = ChannelVolumes::default();
    volumes.set(1, Volume::from(VolumeDB(volume_db)));
    volumes
}

/// A connected PulseAudio session
///
/// Dropping the session disconnects the context and stops the mainloop
/// thread; this is safe at any point of a failed [`PulseSession::open`].
pub struct PulseSession {
    // Field order matters: the context is released before the mainloop.
    context: Rc<RefCell<Context>>,
    mainloop: SharedMainloop,
    /// Whether the mainloop thread is running
    started: bool,
    closed: bool,
    /// Outcome of the last success-reporting request
    success: Rc<Cell<bool>>,
}

impl PulseSession {
    /// Start a mainloop thread and connect to the server
    ///
    /// Blocks until the context is ready, failed or terminated.
    pub fn open(config: &ClientConfig) -> MixerResult<Self> {
        config.validate()?;
        debug!(
            "Opening PulseAudio session (client: {}, server: {:?})",
            config.client_name, config.server
        );

        let mainloop = Mainloop::new().ok_or_else(|| {
            MixerError::InitializationFailed("failed to create threaded mainloop".into())
        })?;
        let mainloop = Rc::new(RefCell::new(mainloop));

        let context = Context::new(&*mainloop.borrow(), &config.client_name).ok_or_else(|| {
            MixerError::InitializationFailed("failed to create context".into())
        })?;

        let mut session = Self {
            context: Rc::new(RefCell::new(context)),
            mainloop,
            started: false,
            closed: false,
            success: Rc::new(Cell::new(false)),
        };

        // On error the session is dropped here, which cleans up whatever
        // was already started.
        session.connect(config.server.as_deref())?;
        debug!("PulseAudio session ready");
        Ok(session)
    }

    fn connect(&mut self, server: Option<&str>) -> MixerResult<()> {
        let callback = state_callback(Rc::downgrade(&self.context), Rc::clone(&self.mainloop));
        self.context.borrow_mut().set_state_callback(Some(callback));

        self.context
            .borrow_mut()
            .connect(server, ContextFlagSet::NOFLAGS, None)
            .map_err(|e| MixerError::ConnectionFailed(format!("{}", e)))?;

        let state = {
            let guard = LoopLock::acquire(&*self.mainloop);
            self.mainloop.borrow_mut().start().map_err(|e| {
                MixerError::InitializationFailed(format!("failed to start mainloop: {}", e))
            })?;
            self.started = true;

            loop {
                let state = self.context.borrow().get_state();
                if is_terminal(state) {
                    break state;
                }
                guard.wait();
            }
        };

        if state != ContextState::Ready {
            return Err(MixerError::ConnectionFailed(format!(
                "context entered state {:?}",
                state
            )));
        }
        Ok(())
    }

    /// Disconnect and stop the mainloop thread
    ///
    /// Idempotent; also run on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if self.started {
            {
                let _guard = LoopLock::acquire(&*self.mainloop);
                let mut context = self.context.borrow_mut();
                context.set_state_callback(None);
                context.disconnect();
            }
            self.mainloop.borrow_mut().stop();
            self.started = false;
        } else {
            let mut context = self.context.borrow_mut();
            context.set_state_callback(None);
            context.disconnect();
        }
        debug!("PulseAudio session closed");
    }

    /// Callback recording a success flag and waking the caller
    fn success_callback(&self) -> Box<dyn FnMut(bool) + 'static> {
        self.success.set(false);
        let mainloop = Rc::clone(&self.mainloop);
        let success = Rc::clone(&self.success);
        Box::new(move |ok| {
            success.set(ok);
            signal(&mainloop);
        })
    }

    /// Run one success-reporting request and return its outcome
    ///
    /// A request cancelled by a dying connection reports `false`.
    fn request<G, F>(&self, submit: F) -> MixerResult<bool>
    where
        G: ?Sized + 'static,
        F: FnOnce(Box<dyn FnMut(bool) + 'static>) -> Operation<G>,
    {
        let context = &self.context;
        let callback = self.success_callback();
        submit_and_wait(&*self.mainloop, move || -> MixerResult<_> {
            check_ready(context)?;
            Ok(submit(callback))
        })?;
        let ok = self.success.get();
        debug!("Request completed (ok: {})", ok);
        Ok(ok)
    }

    fn list<T, F, G>(&self, what: &str, submit: F) -> MixerResult<Vec<T>>
    where
        G: ?Sized + 'static,
        F: FnOnce(Rc<RefCell<ListCollector<T>>>) -> Operation<G>,
    {
        let context = &self.context;
        let collector = Rc::new(RefCell::new(ListCollector::new()));
        let shared = Rc::clone(&collector);
        submit_and_wait(&*self.mainloop, move || -> MixerResult<_> {
            check_ready(context)?;
            Ok(submit(shared))
        })?;

        let collector = std::mem::take(&mut *collector.borrow_mut());
        if !collector.is_finished() {
            return Err(MixerError::OperationFailed(format!(
                "listing {} was cancelled",
                what
            )));
        }
        let failed = collector.failed();
        let items = collector.into_items();
        if failed {
            warn!(
                "Server error while listing {}; keeping {} entries",
                what,
                items.len()
            );
        }
        Ok(items)
    }
}

impl Drop for PulseSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl MixerBackend for PulseSession {
    fn name(&self) -> &'static str {
        "PulseAudio"
    }

    fn server_info(&mut self) -> MixerResult<ServerInfo> {
        let result: Rc<RefCell<Option<ServerInfo>>> = Rc::new(RefCell::new(None));
        {
            let mainloop = Rc::clone(&self.mainloop);
            let result = Rc::clone(&result);
            let context = &self.context;
            submit_and_wait(&*self.mainloop, move || -> MixerResult<_> {
                check_ready(context)?;
                Ok(context.borrow().introspect().get_server_info(move |info| {
                    *result.borrow_mut() = Some(ServerInfo {
                        default_sink: info.default_sink_name.as_ref().map(|n| n.to_string()),
                    });
                    signal(&mainloop);
                }))
            })?;
        }

        let info = result.borrow_mut().take().ok_or_else(|| {
            MixerError::OperationFailed("server info request was cancelled".into())
        })?;
        debug!("Default sink: {:?}", info.default_sink);
        Ok(info)
    }

    fn sinks(&mut self) -> MixerResult<Vec<SinkEntry>> {
        let mainloop = Rc::clone(&self.mainloop);
        let context = &self.context;
        self.list("sinks", move |collector| {
            context.borrow().introspect().get_sink_info_list(move |result| {
                collector.borrow_mut().accept(list_item(result, sink_entry));
                signal(&mainloop);
            })
        })
    }

    fn sink_inputs(&mut self) -> MixerResult<Vec<SinkInputEntry>> {
        let mainloop = Rc::clone(&self.mainloop);
        let context = &self.context;
        self.list("sink inputs", move |collector| {
            context.borrow().introspect().get_sink_input_info_list(move |result| {
                collector.borrow_mut().accept(list_item(result, sink_input_entry));
                signal(&mainloop);
            })
        })
    }

    fn set_mute(&mut self, target: Target, index: u32, mute: bool) -> MixerResult<bool> {
        debug!("Setting {} {} mute={}", target.as_str(), index, mute);
        let context = &self.context;
        self.request(move |callback| {
            let mut introspect = context.borrow().introspect();
            match target {
                Target::Sink => introspect.set_sink_mute_by_index(index, mute, Some(callback)),
                Target::SinkInput => introspect.set_sink_input_mute(index, mute, Some(callback)),
            }
        })
    }

    fn set_volume(&mut self, target: Target, index: u32, volume_db: f64) -> MixerResult<bool> {
        debug!("Setting {} {} volume={:.2} dB", target.as_str(), index, volume_db);
        let volumes = mono_volume(volume_db);
        let context = &self.context;
        self.request(move |callback| {
            let mut introspect = context.borrow().introspect();
            match target {
                Target::Sink => {
                    introspect.set_sink_volume_by_index(index, &volumes, Some(callback))
                }
                Target::SinkInput => {
                    introspect.set_sink_input_volume(index, &volumes, Some(callback))
                }
            }
        })
    }

    fn move_sink_input(&mut self, sink_input: u32, sink: u32) -> MixerResult<bool> {
        debug!("Moving sink input {} to sink {}", sink_input, sink);
        let context = &self.context;
        self.request(move |callback| {
            context
                .borrow()
                .introspect()
                .move_sink_input_by_index(sink_input, sink, Some(callback))
        })
    }

    fn set_default_sink(&mut self, name: &str) -> MixerResult<bool> {
        debug!("Setting default sink {:?}", name);
        if name.contains('\0') {
            return Err(MixerError::InvalidArgument(
                "sink name contains a NUL byte".into(),
            ));
        }
        let context = &self.context;
        self.request(move |callback| context.borrow_mut().set_default_sink(name, callback))
    }
}
