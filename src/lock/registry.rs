use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Process-scoped table of per-index write mutexes.
///
/// One binary mutex exists per index name, created lazily under the registry
/// lock and never removed. Holding a name's mutex is what gives a mutating
/// operation its single-writer guarantee; readers bypass the registry
/// entirely. This is an in-process device only; it does not protect an
/// on-disk index shared by multiple processes.
#[derive(Default)]
pub struct MutexRegistry {
    entries: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MutexRegistry {
    pub fn new() -> Self {
        MutexRegistry::default()
    }

    /// The mutex for an index name; created on first request. Repeated calls
    /// for the same name always return the same mutex object.
    pub fn get(&self, name: &str) -> Arc<Mutex<()>> {
        let mut entries = self.entries.lock();
        entries.entry(name.to_string()).or_default().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_name_yields_same_mutex() {
        let registry = MutexRegistry::new();
        let a = registry.get("people");
        let b = registry.get("people");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_names_are_independent() {
        let registry = MutexRegistry::new();
        let a = registry.get("people");
        let b = registry.get("orders");
        assert!(!Arc::ptr_eq(&a, &b));

        // holding one name's mutex must not block the other
        let _guard = a.lock();
        assert!(b.try_lock().is_some());
    }

    #[test]
    fn concurrent_first_access_creates_one_mutex() {
        let registry = Arc::new(MutexRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.get("shared"))
            })
            .collect();
        let mutexes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for mutex in &mutexes[1..] {
            assert!(Arc::ptr_eq(&mutexes[0], mutex));
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn mutex_admits_one_holder_at_a_time() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let registry = Arc::new(MutexRegistry::new());
        let active = Arc::new(AtomicU32::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                let active = active.clone();
                thread::spawn(move || {
                    let mutex = registry.get("serialized");
                    for _ in 0..50 {
                        let _guard = mutex.lock();
                        assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                        thread::sleep(Duration::from_micros(10));
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }
}
