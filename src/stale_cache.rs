use parking_lot::RwLock;

/// Last-known-good value of a single field.
///
/// Owned by one projector. There is no expiry and no capacity bound: a put
/// overwrites the slot in place and the value lives until the next put or
/// until the cache is dropped. Writes replace the whole value under the lock,
/// so a concurrent reader sees either the previous or the new value.
#[derive(Debug)]
pub struct StaleValueCache<T> {
    slot: RwLock<Option<T>>,
}

impl<T: Clone> StaleValueCache<T> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Option<T> {
        self.slot.read().clone()
    }

    pub fn put(&self, value: T) {
        *self.slot.write() = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        self.slot.read().is_none()
    }
}

impl<T: Clone> Default for StaleValueCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_empty_until_first_put() {
        let cache: StaleValueCache<i64> = StaleValueCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get(), None);

        cache.put(1500);
        assert!(!cache.is_empty());
        assert_eq!(cache.get(), Some(1500));
    }

    #[test]
    fn test_put_overwrites_in_place() {
        let cache = StaleValueCache::new();
        cache.put("first".to_string());
        cache.put("second".to_string());
        assert_eq!(cache.get().as_deref(), Some("second"));
        // reads do not consume
        assert_eq!(cache.get().as_deref(), Some("second"));
    }

    #[test]
    fn test_concurrent_reads_never_see_torn_values() {
        let cache = Arc::new(StaleValueCache::<(u64, String)>::new());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let cache = cache.clone();
            let done = done.clone();
            thread::spawn(move || {
                for i in 0..20_000u64 {
                    cache.put((i, i.to_string()));
                }
                done.store(true, Ordering::Release);
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let mut last_seen = 0u64;
                    while !done.load(Ordering::Acquire) {
                        if let Some((n, text)) = cache.get() {
                            assert_eq!(n.to_string(), text, "torn value observed");
                            assert!(n >= last_seen, "value went backwards");
                            last_seen = n;
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cache.get(), Some((19_999, "19999".to_string())));
    }
}
