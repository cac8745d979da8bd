use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// A restartable, cancellable one-shot timer that runs a command on expiry
///
/// At most one command is pending at a time. Restarting or cancelling bumps
/// a generation counter under the same lock the expiring task takes, so a
/// superseded command never runs even if its task already woke up.
pub(crate) struct DelayedCommand<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

struct Slot<T> {
    generation: u64,
    pending: Option<Pending<T>>,
}

struct Pending<T> {
    tag: T,
    task: JoinHandle<()>,
}

impl<T: Copy + Send + 'static> DelayedCommand<T> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                pending: None,
            })),
        }
    }

    /// Replace any pending command with a new one due after `delay`
    ///
    /// `now` runs under the timer lock with the tag of the command it
    /// replaced, so commands issued there cannot interleave with an expiry.
    /// It must not block.
    pub fn restart<F, G>(&self, tag: T, delay: Duration, now: F, on_expiry: G)
    where
        F: FnOnce(Option<T>),
        G: FnOnce() + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        let previous = slot.take_pending();
        slot.generation += 1;
        let generation = slot.generation;

        now(previous);

        let shared = Arc::clone(&self.slot);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut slot = lock(&shared);
            if slot.generation != generation {
                return;
            }
            slot.pending = None;
            on_expiry();
        });
        slot.pending = Some(Pending { tag, task });
    }

    /// Cancel the pending command, returning its tag
    pub fn cancel(&self) -> Option<T> {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        slot.take_pending()
    }
}

impl<T> Slot<T> {
    fn take_pending(&mut self) -> Option<T> {
        self.pending.take().map(|pending| {
            pending.task.abort();
            pending.tag
        })
    }
}

impl<T> Drop for DelayedCommand<T> {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        slot.take_pending();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
