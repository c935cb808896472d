//! Event Loop Bridge
//!
//! Turns an asynchronous request into a blocking call. The event loop runs
//! on its own thread and exposes a lock plus a condition signal; a caller
//! takes the lock, submits the request, then sleeps on the signal until the
//! returned operation has left the running state.
//!
//! ```text
//! Calling Thread                  Event Loop Thread
//! ──────────────                  ─────────────────
//! lock()
//! submit() ─── request ─────────► dispatch
//! wait()   ◄── signal ─────────── completion callback
//! is_running()? no
//! drop(op), unlock()
//! ```

/// The lock and condition signal of a background event loop
pub trait LoopControl {
    /// Take the loop lock; the loop thread does not run callbacks while held
    fn lock(&self);

    /// Release the loop lock
    fn unlock(&self);

    /// Release the lock, sleep until signalled, then retake the lock
    fn wait(&self);
}

/// An in-flight asynchronous request
pub trait PendingOperation {
    /// Whether the request has yet to complete or be cancelled
    fn is_running(&self) -> bool;
}

/// Holds the loop lock until dropped
pub struct LoopLock<'a, L: LoopControl + ?Sized> {
    control: &'a L,
}

impl<'a, L: LoopControl + ?Sized> LoopLock<'a, L> {
    pub fn acquire(control: &'a L) -> Self {
        control.lock();
        Self { control }
    }

    /// Sleep until the loop signals, keeping the lock on return
    pub fn wait(&self) {
        self.control.wait();
    }
}

impl<L: LoopControl + ?Sized> Drop for LoopLock<'_, L> {
    fn drop(&mut self) {
        self.control.unlock();
    }
}

/// Submit one request and block until it is no longer running
///
/// `submit` runs with the loop lock held and may refuse to issue the
/// request, in which case nothing is awaited. The returned operation handle
/// is dropped before the lock is released.
///
/// Waking the caller is up to the loop: completion callbacks signal, and so
/// must whatever observes the connection dying, since cancelled operations
/// get no callback.
pub fn submit_and_wait<L, O, E, F>(control: &L, submit: F) -> Result<(), E>
where
    L: LoopControl + ?Sized,
    O: PendingOperation,
    F: FnOnce() -> Result<O, E>,
{
    let guard = LoopLock::acquire(control);
    let operation = submit()?;
    while operation.is_running() {
        guard.wait();
    }
    drop(operation);
    drop(guard);
    Ok(())
}
