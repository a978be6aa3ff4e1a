//! Node identifier allocation
//!
//! Identifiers are decimal strings of a strictly increasing counter. They are
//! never reused, even after the node holding one is removed.

use super::types::NodeId;

/// Largest recovered id the allocator will continue from.
///
/// Anything above it was not produced by an allocator and would leave no
/// room to keep counting.
pub const MAX_RESYNC_ID: u64 = i64::MAX as u64;

/// Hands out unique, strictly increasing node identifiers
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    /// Last value handed out (0 = none yet)
    counter: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier
    pub fn next(&mut self) -> NodeId {
        self.counter += 1;
        NodeId::from(self.counter)
    }

    /// Last value handed out, or the position reached by `resync`
    pub fn current(&self) -> u64 {
        self.counter
    }

    /// Advance the counter to at least the largest numeric id in `existing`.
    ///
    /// Non-numeric ids and ids above `MAX_RESYNC_ID` are ignored. The
    /// counter never moves backwards.
    pub fn resync<'a, I>(&mut self, existing: I)
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        let max_seen = existing
            .into_iter()
            .filter_map(NodeId::as_number)
            .filter(|n| *n <= MAX_RESYNC_ID)
            .max()
            .unwrap_or(0);
        self.counter = self.counter.max(max_seen);
    }
}
