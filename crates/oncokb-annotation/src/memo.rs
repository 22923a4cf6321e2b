//! Single-entry memo for derived views.

use std::sync::Arc;

/// Revisions of everything a view was computed from.
pub type MemoKey = Vec<u64>;

/// Holds the last computed value and the key it was computed for.
#[derive(Debug)]
pub struct Memo<T> {
    entry: Option<(MemoKey, Arc<T>)>,
    computations: u64,
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self { entry: None, computations: 0 }
    }

    /// Return the cached value if `key` matches, otherwise recompute and cache.
    pub fn get_or_compute<F>(&mut self, key: MemoKey, compute: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        if let Some((cached, value)) = &self.entry {
            if *cached == key {
                return Arc::clone(value);
            }
        }
        let value = Arc::new(compute());
        self.computations += 1;
        self.entry = Some((key, Arc::clone(&value)));
        value
    }

    /// How many times the value has been computed.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_reuses_value() {
        let mut memo = Memo::new();
        let first = memo.get_or_compute(vec![1, 2], || "a".to_string());
        let second = memo.get_or_compute(vec![1, 2], || unreachable!());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(memo.computations(), 1);
    }

    #[test]
    fn test_new_key_recomputes() {
        let mut memo = Memo::new();
        memo.get_or_compute(vec![1], || 1u32);
        let value = memo.get_or_compute(vec![2], || 2u32);
        assert_eq!(*value, 2);
        assert_eq!(memo.computations(), 2);

        memo.get_or_compute(vec![1], || 3u32);
        assert_eq!(memo.computations(), 3, "only the latest key is kept");
    }
}
