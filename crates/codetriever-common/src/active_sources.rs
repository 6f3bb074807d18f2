//! Process-wide set of source paths that constrain ordinary search scope
//! (§3 `ActiveSources`). A single mutex is the whole synchronization story:
//! the set is small and mutated rarely compared to the ingestion/search
//! traffic that reads it.

use std::collections::HashSet;
use std::sync::Mutex;

/// Mutation/read surface over the active-source set. `None` from
/// [`Self::snapshot`] means "no restriction" — every source is in scope.
#[derive(Default)]
pub struct ActiveSources {
    inner: Mutex<Option<HashSet<String>>>,
}

impl ActiveSources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `paths` active, narrowing the scope to exactly this set (and
    /// any previously active paths) the first time this is called.
    pub fn mark_active(&self, paths: impl IntoIterator<Item = String>) {
        let mut guard = self.inner.lock().expect("active sources mutex poisoned");
        let set = guard.get_or_insert_with(HashSet::new);
        set.extend(paths);
    }

    /// Removes `paths` from the active set. If every path is removed the
    /// set becomes empty (scope narrows to "nothing"), distinct from never
    /// having called `mark_active` at all (scope = "everything").
    pub fn mark_inactive(&self, paths: impl IntoIterator<Item = String>) {
        let mut guard = self.inner.lock().expect("active sources mutex poisoned");
        if let Some(set) = guard.as_mut() {
            for path in paths {
                set.remove(&path);
            }
        }
    }

    /// `None` if the active set has never been narrowed (no restriction);
    /// otherwise a snapshot of the current active paths.
    #[must_use]
    pub fn snapshot(&self) -> Option<Vec<String>> {
        let guard = self.inner.lock().expect("active sources mutex poisoned");
        guard.as_ref().map(|set| set.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_by_default() {
        let active = ActiveSources::new();
        assert_eq!(active.snapshot(), None);
    }

    #[test]
    fn mark_active_narrows_scope() {
        let active = ActiveSources::new();
        active.mark_active(["a.txt".to_string(), "b.txt".to_string()]);
        let mut snap = active.snapshot().unwrap();
        snap.sort();
        assert_eq!(snap, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }

    #[test]
    fn mark_inactive_removes_from_scope() {
        let active = ActiveSources::new();
        active.mark_active(["a.txt".to_string(), "b.txt".to_string()]);
        active.mark_inactive(["a.txt".to_string()]);
        assert_eq!(active.snapshot(), Some(vec!["b.txt".to_string()]));
    }

    #[test]
    fn mark_inactive_on_unrestricted_scope_is_a_noop() {
        let active = ActiveSources::new();
        active.mark_inactive(["a.txt".to_string()]);
        assert_eq!(active.snapshot(), None);
    }
}
