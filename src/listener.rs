//! Lifecycle of the background receive loop.
//!
//! A [`ListenerController`] owns at most one loop thread. The loop polls a
//! shared run flag between receive steps, so stopping is cooperative: `stop`
//! clears the flag and joins the thread, which exits once its current
//! receive step returns. A transport that never returns from
//! `do_one_listen` will block `stop` forever.
//!
//! `stop` may also be called from a [`MessageHandler`] running on the loop
//! thread. It then only signals the loop, and the thread is reaped by the
//! next `stop` from another thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use log::{debug, info};

use crate::error::{ClientError, Result};
use crate::transport::{MessageHandler, Transport};

/// Where the controller is in its start/stop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// No loop exists. `start` is allowed.
    Idle,
    /// The loop is receiving.
    Running,
    /// `stop` has cleared the run flag and is waiting for the loop to exit.
    Stopping,
    /// The loop exited and hasn't been reaped yet. Only `stop` leaves this state.
    Stopped,
}

struct Shared {
    state: Mutex<ListenerState>,
    running: AtomicBool,
    loop_thread: Mutex<Option<ThreadId>>,
}

/// Runs at most one receive loop over a shared transport.
///
/// Call [`stop`](Self::stop) before dropping the controller. Dropping it only
/// clears the run flag: the loop thread is detached and keeps its transport
/// handle until its current receive step returns.
pub struct ListenerController<T: Transport> {
    transport: Arc<T>,
    shared: Arc<Shared>,
    // Held for the whole of `start` and `stop` so the two never interleave.
    handle: Mutex<Option<JoinHandle<()>>>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Transport> ListenerController<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            shared: Arc::new(Shared {
                state: Mutex::new(ListenerState::Idle),
                running: AtomicBool::new(false),
                loop_thread: Mutex::new(None),
            }),
            handle: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> ListenerState {
        *lock(&self.shared.state)
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state() == ListenerState::Running
    }

    /// Spawns the receive loop, dispatching received messages to `handler`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyListening` unless the controller is `Idle`, including
    /// after the loop exited on its own and `stop` hasn't reaped it yet.
    /// Returns `Io` if the thread could not be spawned.
    pub fn start<H: MessageHandler>(&self, handler: H) -> Result<()> {
        let mut handle = lock(&self.handle);

        {
            let mut state = lock(&self.shared.state);
            let current = *state;
            match current {
                ListenerState::Running | ListenerState::Stopping | ListenerState::Stopped => {
                    return Err(ClientError::AlreadyListening);
                }
                ListenerState::Idle => {}
            }
            *state = ListenerState::Running;
        }

        self.shared.running.store(true, Ordering::Release);

        let transport = Arc::clone(&self.transport);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("listen".to_string())
            .spawn(move || listen_loop(transport.as_ref(), &shared, &handler));

        match spawned {
            Ok(thread) => {
                *handle = Some(thread);
                info!("Client is listening...");
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                *lock(&self.shared.state) = ListenerState::Idle;
                Err(e.into())
            }
        }
    }

    /// Signals the receive loop to stop and waits for its thread to exit.
    ///
    /// On return the loop thread is gone and the controller is `Idle`. When
    /// called from the loop thread itself, the loop is only signalled: the
    /// state becomes `Stopping`, then `Stopped` once the loop exits.
    ///
    /// # Errors
    ///
    /// Returns `NotListening` if no loop is running (including one that
    /// already exited on its own), or `ListenerPanicked` if the loop thread
    /// panicked.
    pub fn stop(&self) -> Result<()> {
        if *lock(&self.shared.loop_thread) == Some(thread::current().id()) {
            return self.stop_from_loop();
        }

        let mut handle = lock(&self.handle);

        {
            let mut state = lock(&self.shared.state);
            let current = *state;
            match current {
                ListenerState::Idle => return Err(ClientError::NotListening),
                ListenerState::Stopped => {
                    *state = ListenerState::Idle;
                    drop(state);
                    debug!("Listener had already exited, reaping thread");
                    reap(handle.take())?;
                    return Err(ClientError::NotListening);
                }
                ListenerState::Running | ListenerState::Stopping => {
                    *state = ListenerState::Stopping;
                }
            }
        }

        info!("Stopping client listen...");
        self.shared.running.store(false, Ordering::Release);
        let joined = reap(handle.take());
        *lock(&self.shared.state) = ListenerState::Idle;
        joined?;

        info!("Client stopped listening");
        Ok(())
    }

    // Joining here would join the current thread, so only signal the loop.
    fn stop_from_loop(&self) -> Result<()> {
        let mut state = lock(&self.shared.state);
        if *state != ListenerState::Running {
            return Err(ClientError::NotListening);
        }
        *state = ListenerState::Stopping;
        self.shared.running.store(false, Ordering::Release);
        info!("Stop requested from the listener thread");
        Ok(())
    }
}

impl<T: Transport> Drop for ListenerController<T> {
    fn drop(&mut self) {
        // The thread finishes its current receive step and exits on its own.
        self.shared.running.store(false, Ordering::Release);
    }
}

fn reap(handle: Option<JoinHandle<()>>) -> Result<()> {
    match handle {
        Some(thread) => thread.join().map_err(|_| ClientError::ListenerPanicked),
        None => Ok(()),
    }
}

/// Marks the loop as exited when dropped, including during a panic unwind.
struct ExitGuard<'a>(&'a Shared);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
        let mut state = lock(&self.0.state);
        if matches!(*state, ListenerState::Running | ListenerState::Stopping) {
            *state = ListenerState::Stopped;
        }
    }
}

fn listen_loop<T: Transport, H: MessageHandler>(transport: &T, shared: &Shared, handler: &H) {
    *lock(&shared.loop_thread) = Some(thread::current().id());
    let _guard = ExitGuard(shared);

    match transport.start_listening() {
        Ok(()) => {
            handler.on_listening();
            while shared.running.load(Ordering::Acquire) {
                match transport.do_one_listen(handler) {
                    Ok(true) => {}
                    Ok(false) => {
                        info!("Session ended, listener exiting");
                        break;
                    }
                    Err(e) => {
                        transport.on_listen_error(&e);
                        break;
                    }
                }
            }
        }
        Err(e) => transport.on_listen_error(&e),
    }

    transport.stop_listening();
    debug!("Listener loop exited");
}
