use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Rotating cursor shared by every clone.
#[derive(Clone, Debug, Default)]
pub struct RoundRobin {
    cursor: Arc<AtomicUsize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor and map it into `0..len`. `None` for an empty set.
    pub fn next_index(&self, len: usize) -> Option<usize> {
        let turn = self.cursor.fetch_add(1, Ordering::Relaxed);
        turn.checked_rem(len)
    }

    /// The member whose turn it is.
    pub fn pick<'a, T>(&self, members: &'a [T]) -> Option<&'a T> {
        self.next_index(members.len()).and_then(|i| members.get(i))
    }
}
