//! Cross-thread posting onto the UI-owning thread.
//!
//! [`ui_channel`] splits into a [`Poster`], which is `Send + Clone` and may be
//! handed to any worker, and an [`EventLoop`], which is `!Send` and stays on
//! the thread that owns UI state. Workers never touch UI state directly; they
//! post a callback and the event loop runs it on its next turn.
//!
//! Posts from one thread run in the order they were made. Once shutdown has
//! begun every further `post` is dropped without blocking or panicking.

use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, error};

/// Work executed on the UI thread against its state.
pub type UiCallback<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

enum UiMessage<S> {
    Run(UiCallback<S>),
    Shutdown,
}

/// Create a connected poster / event loop pair for UI state `S`.
pub fn ui_channel<S>() -> (Poster<S>, EventLoop<S>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        Poster {
            tx,
            closed: Arc::clone(&closed),
        },
        EventLoop {
            rx,
            closed,
            stopped: false,
            _not_send: PhantomData,
        },
    )
}

/// Worker-side handle for scheduling callbacks on the UI thread.
pub struct Poster<S> {
    tx: mpsc::UnboundedSender<UiMessage<S>>,
    closed: Arc<AtomicBool>,
}

impl<S> Clone for Poster<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl<S> std::fmt::Debug for Poster<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poster")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<S> Poster<S> {
    /// Enqueue `callback` for the UI thread's next turn.
    ///
    /// Never blocks. A no-op once shutdown has begun or the event loop is gone.
    pub fn post<F>(&self, callback: F)
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if self.tx.send(UiMessage::Run(Box::new(callback))).is_err() {
            debug!("ui event loop gone, dropping posted callback");
        }
    }

    /// Begin UI shutdown. The event loop exits after the callbacks already
    /// queued ahead of this request have run.
    pub fn request_shutdown(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.tx.send(UiMessage::Shutdown);
        }
    }

    /// Returns `true` once shutdown has begun.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }
}

/// UI-thread side of the posting channel.
///
/// Deliberately `!Send`: it must be driven by the thread that owns `S`.
pub struct EventLoop<S> {
    rx: mpsc::UnboundedReceiver<UiMessage<S>>,
    closed: Arc<AtomicBool>,
    stopped: bool,
    _not_send: PhantomData<*const ()>,
}

impl<S> EventLoop<S> {
    /// Run posted callbacks until shutdown is requested or every poster is
    /// dropped.
    ///
    /// Blocks the calling thread. Must not be called from inside an async
    /// runtime context.
    pub fn run(mut self, state: &mut S) {
        while !self.stopped {
            match self.rx.blocking_recv() {
                Some(message) => self.handle(message, state),
                None => self.stop(),
            }
        }
    }

    /// Wait for and process a single message. Returns `false` once the loop
    /// has stopped.
    pub async fn turn(&mut self, state: &mut S) -> bool {
        if self.stopped {
            return false;
        }
        match self.rx.recv().await {
            Some(message) => self.handle(message, state),
            None => self.stop(),
        }
        !self.stopped
    }

    /// Run every callback already queued without waiting. Returns how many ran.
    pub fn run_pending(&mut self, state: &mut S) -> usize {
        let mut ran = 0;
        while !self.stopped {
            match self.rx.try_recv() {
                Ok(UiMessage::Run(callback)) => {
                    Self::dispatch(callback, state);
                    ran += 1;
                }
                Ok(UiMessage::Shutdown) => self.stop(),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => self.stop(),
            }
        }
        ran
    }

    /// Returns `true` once shutdown was observed.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn handle(&mut self, message: UiMessage<S>, state: &mut S) {
        match message {
            UiMessage::Run(callback) => Self::dispatch(callback, state),
            UiMessage::Shutdown => self.stop(),
        }
    }

    fn dispatch(callback: UiCallback<S>, state: &mut S) {
        if catch_unwind(AssertUnwindSafe(|| callback(state))).is_err() {
            error!("posted ui callback panicked; continuing event loop");
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.closed.store(true, Ordering::Release);
        self.rx.close();
    }
}

impl<S> Drop for EventLoop<S> {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}
