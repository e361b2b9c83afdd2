use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Collects the file names written by one or more batch groups.
///
/// Cloning is cheap and every clone sees the same list. Names are appended as
/// flushes complete, so across concurrently flushing batches the order is
/// completion order rather than batch order.
///
/// # Examples
///
/// ```
/// use mapgen_sitemap::Registry;
///
/// let registry = Registry::default();
/// assert!(registry.is_empty());
/// registry.clear();
/// assert_eq!(registry.names(), Vec::<String>::new());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Registry {
    names: Arc<Mutex<Vec<String>>>,
}
impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, name: String) {
        self.lock().push(name);
    }

    /// Snapshot of the names recorded so far.
    pub fn names(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a half-pushed name behind.
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.names.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_names() {
        let registry = Registry::new();
        let clone = registry.clone();
        clone.push("site_1.xml.gz".to_string());
        registry.push("site_2.xml.gz".to_string());
        assert_eq!(registry.names(), vec!["site_1.xml.gz", "site_2.xml.gz"]);
        assert_eq!(clone.len(), 2);

        registry.clear();
        assert!(clone.is_empty());
    }

    #[test]
    fn test_concurrent_pushes() {
        let registry = Registry::new();
        std::thread::scope(|scope| {
            for n in 0..8 {
                let registry = registry.clone();
                scope.spawn(move || {
                    for m in 0..100 {
                        registry.push(format!("site_{n}_{m}.xml.gz"));
                    }
                });
            }
        });
        assert_eq!(registry.len(), 800);
    }
}
