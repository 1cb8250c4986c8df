use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

/// Why dependents should re-read engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The active script changed.
    ScriptChanged { script: String },
    /// A background conversion landed in the cache. The key is not reported;
    /// re-render and read through the cache.
    ConversionReady,
}

/// Handle returned by `add_listener`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) type Listener = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Registration-ordered callback list.
pub(crate) struct ListenerSet {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, Listener)>>,
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

impl ListenerSet {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, listener));
        id
    }

    /// Unknown or already-removed ids are ignored.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Call every listener in registration order.
    ///
    /// The list is snapshotted first, so listeners may add or remove
    /// listeners (including themselves) while being notified. A panicking
    /// listener is logged and skipped.
    pub fn notify(&self, event: &EngineEvent) {
        let snapshot: Vec<(ListenerId, Listener)> = self.lock().clone();
        for (id, listener) in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                warn!(
                    listener = id.0,
                    ?event,
                    panic = %crate::panic_message(&*payload),
                    "listener panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Listener {
        let log = Arc::clone(log);
        Arc::new(move |_: &EngineEvent| log.lock().unwrap().push(tag))
    }

    #[test]
    fn test_notify_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let set = ListenerSet::new();
        set.add(recorder(&log, "a"));
        set.add(recorder(&log, "b"));
        set.add(recorder(&log, "c"));
        set.notify(&EngineEvent::ConversionReady);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let set = ListenerSet::new();
        let a = set.add(recorder(&log, "a"));
        set.add(recorder(&log, "b"));
        assert!(set.remove(a));
        assert!(!set.remove(a));
        set.notify(&EngineEvent::ConversionReady);
        assert_eq!(*log.lock().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_panicking_listener_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let set = ListenerSet::new();
        set.add(recorder(&log, "before"));
        set.add(Arc::new(|_: &EngineEvent| panic!("listener bug")));
        set.add(recorder(&log, "after"));
        set.notify(&EngineEvent::ConversionReady);
        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
    }

    #[test]
    fn test_listener_may_remove_itself() {
        let set = Arc::new(ListenerSet::new());
        let calls = Arc::new(Mutex::new(0));
        let id_slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let weak = Arc::downgrade(&set);
        let id = {
            let calls = Arc::clone(&calls);
            let id_slot = Arc::clone(&id_slot);
            set.add(Arc::new(move |_: &EngineEvent| {
                *calls.lock().unwrap() += 1;
                if let (Some(set), Some(id)) = (weak.upgrade(), *id_slot.lock().unwrap()) {
                    set.remove(id);
                }
            }))
        };
        *id_slot.lock().unwrap() = Some(id);
        set.notify(&EngineEvent::ConversionReady);
        set.notify(&EngineEvent::ConversionReady);
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(set.len(), 0);
    }
}
