use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

/// Process-wide identifier for a catalog entry.
///
/// Ids are allocated from a monotonically increasing counter so that entries
/// loaded after a catalog snapshot never collide with entries already in
/// memory.
#[derive(Debug, Copy, Clone, Eq, PartialOrd, Ord, PartialEq, Serialize, Deserialize, Hash)]
pub struct EntryId(u32);

static NEXT_ENTRY_ID: AtomicU32 = AtomicU32::new(0);

impl EntryId {
    pub fn new() -> Self {
        Self(
            NEXT_ENTRY_ID
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
                .expect("Overflowed with Entry IDs"),
        )
    }

    /// The next id that will be handed out, without allocating it.
    pub fn next_id() -> Self {
        Self(NEXT_ENTRY_ID.load(Ordering::SeqCst))
    }

    /// Reset the allocator so the next id handed out is this one. Used when
    /// loading a catalog snapshot that already contains ids.
    pub fn set_next_id(&self) {
        NEXT_ENTRY_ID.store(self.0, Ordering::SeqCst)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u32> for EntryId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
