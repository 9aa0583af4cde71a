//! Visited set for compound conversion
//!
//! Holds the identities of the tables on the current descent path. A table
//! is entered before its elements are converted and left afterwards, so a
//! table shared by two siblings is not mistaken for a cycle.

use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct VisitedSet {
    path: HashSet<usize>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` on the path; false if it is already there (a cycle)
    #[inline]
    pub fn enter(&mut self, id: usize) -> bool {
        self.path.insert(id)
    }

    #[inline]
    pub fn leave(&mut self, id: usize) {
        self.path.remove(&id);
    }

    #[inline]
    pub fn contains(&self, id: usize) -> bool {
        self.path.contains(&id)
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }
}
