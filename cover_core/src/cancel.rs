//! Cancellation handshake between movement requests.
//!
//! Every movement request owns a `CancelToken`; the matching `CancelHandle`
//! sits in the cover's active slot. A newer request (or `stop`) takes the
//! handle, signals it, and can then wait for the running request to
//! acknowledge that it has unwound. Dropping the token without acknowledging
//! (e.g. on panic) counts as an acknowledgement.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
    done: xch::Receiver<()>,
}

#[derive(Debug)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    done: xch::Sender<()>,
}

/// Create a linked handle/token pair for one movement request.
pub fn pair() -> (CancelHandle, CancelToken) {
    let flag = Arc::new(AtomicBool::new(false));
    let (tx, rx) = xch::bounded(1);
    (
        CancelHandle {
            flag: flag.clone(),
            done: rx,
        },
        CancelToken { flag, done: tx },
    )
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Block until the token acknowledges or is dropped. Returns false on timeout.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(xch::RecvTimeoutError::Disconnected) => true,
            Err(xch::RecvTimeoutError::Timeout) => false,
        }
    }

    /// Whether this handle controls `token`.
    pub fn is_for(&self, token: &CancelToken) -> bool {
        Arc::ptr_eq(&self.flag, &token.flag)
    }
}

impl CancelToken {
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Signal that the request has fully unwound.
    pub fn acknowledge(self) {
        let _ = self.done.try_send(());
    }
}
