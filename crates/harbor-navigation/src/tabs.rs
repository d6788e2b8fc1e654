//! One history stack per tab

use std::collections::HashMap;
use std::hash::Hash;

use crate::stack::{NavHistory, NavMove};

#[derive(Debug, Clone)]
pub struct TabHistories<K> {
    stacks: HashMap<K, NavHistory>,
}

impl<K: Eq + Hash + Clone> TabHistories<K> {
    pub fn new() -> Self {
        Self {
            stacks: HashMap::new(),
        }
    }

    pub fn get(&self, tab: &K) -> Option<&NavHistory> {
        self.stacks.get(tab)
    }

    pub fn get_mut(&mut self, tab: &K) -> &mut NavHistory {
        self.stacks.entry(tab.clone()).or_default()
    }

    pub fn observe(&mut self, tab: &K, url: &str) -> NavMove {
        if url.is_empty() {
            return NavMove::Unchanged;
        }
        self.get_mut(tab).observe(url)
    }

    pub fn remove(&mut self, tab: &K) -> Option<NavHistory> {
        self.stacks.remove(tab)
    }

    /// Drops stacks for tabs no longer open.
    pub fn retain_open(&mut self, open: &[K]) {
        let before = self.stacks.len();
        self.stacks.retain(|tab, _| open.contains(tab));

        let dropped = before - self.stacks.len();
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped history stacks for closed tabs");
        }
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for TabHistories<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stacks_are_independent() {
        let mut histories: TabHistories<u64> = TabHistories::new();

        histories.observe(&1, "https://a.test");
        histories.observe(&1, "https://a.test/next");
        histories.observe(&2, "https://b.test");

        assert_eq!(histories.get(&1).unwrap().len(), 2);
        assert_eq!(histories.get(&2).unwrap().len(), 1);
        assert_eq!(histories.observe(&1, "https://a.test"), NavMove::Back);
        assert_eq!(histories.get(&2).unwrap().current(), Some("https://b.test"));
    }

    #[test]
    fn test_empty_url_is_ignored() {
        let mut histories: TabHistories<u64> = TabHistories::new();
        assert_eq!(histories.observe(&1, ""), NavMove::Unchanged);
        assert!(histories.is_empty());
    }

    #[test]
    fn test_retain_open() {
        let mut histories: TabHistories<u64> = TabHistories::new();
        histories.observe(&1, "a");
        histories.observe(&2, "b");
        histories.observe(&3, "c");

        histories.retain_open(&[2]);
        assert_eq!(histories.len(), 1);
        assert!(histories.get(&2).is_some());
    }
}
