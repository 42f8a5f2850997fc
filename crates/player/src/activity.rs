use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// Process-wide "someone is speaking" signal, used to duck background music.
///
/// Each [`SpeechClaim`] holds the signal high until it is dropped, so a
/// holder can never deassert more often than it asserted.
#[derive(Debug, Clone)]
pub struct SpeechActivity {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    holders: AtomicUsize,
    active: watch::Sender<bool>,
}

impl Default for SpeechActivity {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechActivity {
    pub fn new() -> Self {
        let (active, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                holders: AtomicUsize::new(0),
                active,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.active.subscribe()
    }

    pub fn is_active(&self) -> bool {
        *self.inner.active.borrow()
    }

    pub fn holders(&self) -> usize {
        self.inner.holders.load(Ordering::SeqCst)
    }

    pub fn claim(&self) -> SpeechClaim {
        if self.inner.holders.fetch_add(1, Ordering::SeqCst) == 0 {
            self.inner.active.send_replace(true);
        }
        SpeechClaim {
            inner: self.inner.clone(),
        }
    }
}

#[derive(Debug)]
pub struct SpeechClaim {
    inner: Arc<Inner>,
}

impl Drop for SpeechClaim {
    fn drop(&mut self) {
        if self.inner.holders.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.active.send_replace(false);
        }
    }
}
