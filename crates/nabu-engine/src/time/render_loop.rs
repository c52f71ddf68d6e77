use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use super::{FrameClock, FrameTime, TickSource};

/// Drives a tick callback on a dedicated thread.
///
/// State machine: `Stopped → Running → Stopped`. The callback runs with the
/// single coarse lock held, so anything else that locks the shared state
/// (the UI thread, teardown) never observes a half-finished tick.
///
/// `stop()` joins the callback thread: once it returns, no tick is in flight
/// and none will start. Dropping a running loop stops it.
#[derive(Debug)]
pub struct RenderLoop<S> {
    state: Arc<Mutex<S>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl<S: Send + 'static> RenderLoop<S> {
    pub fn new(state: S) -> Self {
        Self::from_shared(Arc::new(Mutex::new(state)))
    }

    pub fn from_shared(state: Arc<Mutex<S>>) -> Self {
        Self { state, running: Arc::new(AtomicBool::new(false)), worker: None }
    }

    pub fn shared(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.state)
    }

    /// Locks the shared state. A panic inside a previous tick does not make
    /// the state unreachable.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        lock_state(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Spawns the callback thread. Returns `Ok(false)` if already running.
    pub fn start<T, F>(&mut self, mut source: T, mut tick: F) -> io::Result<bool>
    where
        T: TickSource,
        F: FnMut(&mut S, FrameTime) + Send + 'static,
    {
        if self.is_running() {
            return Ok(false);
        }
        // A worker that died on a panic is reaped before restarting.
        self.join_worker();

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let state = Arc::clone(&self.state);

        let spawned = thread::Builder::new()
            .name("nabu-render".to_owned())
            .spawn(move || {
                let mut clock = FrameClock::new();
                log::debug!("render loop started");
                while running.load(Ordering::Acquire) {
                    let at = source.wait();
                    let mut guard = lock_state(&state);
                    // Checked under the lock: `stop()` may have flipped the
                    // flag while this thread was waiting.
                    if !running.load(Ordering::Acquire) {
                        break;
                    }
                    tick(&mut guard, clock.tick_at(at));
                }
                log::debug!("render loop exited after {} frame(s)", clock.frames());
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(true)
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Clears the running flag and joins the callback thread.
    ///
    /// Returns `false` if the loop was not running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        let had_worker = self.join_worker();
        was_running && had_worker
    }

    fn join_worker(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };
        if worker.join().is_err() {
            log::error!("render loop thread panicked");
        }
        true
    }
}

impl<S> Drop for RenderLoop<S> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("render loop thread panicked");
            }
        }
    }
}

fn lock_state<S>(state: &Mutex<S>) -> MutexGuard<'_, S> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
