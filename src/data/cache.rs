use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Process-lifetime memo table. Entries are never evicted; a restart is the
/// only invalidation.
#[derive(Debug)]
pub struct Memo<K, V> {
    entries: HashMap<K, Arc<V>>,
    hits: u64,
    misses: u64,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K: Eq + Hash, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_with(&mut self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some(v) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(v);
        }
        self.misses += 1;
        let v = Arc::new(compute());
        self.entries.insert(key, Arc::clone(&v));
        v
    }

    /// Like [`Memo::get_or_insert_with`], but failures are returned and
    /// nothing is stored.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(v) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(Arc::clone(v));
        }
        self.misses += 1;
        let v = Arc::new(compute()?);
        self.entries.insert(key, Arc::clone(&v));
        Ok(v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_once_per_key() {
        let mut memo: Memo<&str, usize> = Memo::new();
        let mut calls = 0;
        let a = memo.get_or_insert_with("a", || {
            calls += 1;
            1
        });
        let again = memo.get_or_insert_with("a", || {
            calls += 1;
            2
        });
        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(*again, 1);
        assert_eq!(memo.stats(), (1, 1));
    }

    #[test]
    fn failures_are_not_cached() {
        let mut memo: Memo<u8, String> = Memo::new();
        let err = memo.get_or_try_insert_with(7, || Err::<String, _>("boom"));
        assert_eq!(err, Err("boom"));
        assert_eq!(memo.len(), 0);

        let ok = memo.get_or_try_insert_with(7, || Ok::<_, &str>("fine".to_string()));
        assert_eq!(ok.map(|s| s.to_string()), Ok("fine".to_string()));
        assert_eq!(memo.len(), 1);
    }
}
