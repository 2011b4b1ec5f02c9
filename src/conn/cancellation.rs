use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A thread-safe handle that cancels whatever flow is currently running on
/// its connection.
///
/// Cancelling shuts the transport down; the connection becomes closed and
/// the in-flight caller receives a cancellation error. There is no attempt
/// to drain pending bytes.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    pub(crate) fn new(state: Arc<CancelState>) -> CancelHandle {
        CancelHandle { state }
    }

    /// Cancels the connection.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Whether the connection was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }
}

#[derive(Debug, Default)]
pub(crate) struct CancelState {
    cancelled: AtomicBool,
    socket: Mutex<Option<TcpStream>>,
}

impl CancelState {
    pub fn arm(&self, socket: Option<TcpStream>) {
        if let Ok(mut guard) = self.socket.lock() {
            *guard = socket;
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Ok(mut guard) = self.socket.lock() {
            if let Some(socket) = guard.take() {
                debug!("cancel: shutting the transport down");
                socket.shutdown(Shutdown::Both).ok();
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
