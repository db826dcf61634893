//! In-memory bookmark map with a dirty flag for the flusher.
//!
//! Request handlers read and write here directly. Locks are held only long
//! enough to touch the map or the flag, never across disk I/O.

use bookmark_types::Bookmarks;
use parking_lot::RwLock;

#[derive(Default)]
struct Inner {
    entries: Bookmarks,
    /// Set by every `set`, cleared when the flusher captures a snapshot
    dirty: bool,
}

#[derive(Default)]
pub struct BookmarkStore {
    inner: RwLock<Inner>,
}

impl BookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the position for `item`.
    pub fn set(&self, item: &str, position: i64) {
        let mut inner = self.inner.write();
        inner.entries.insert(item.to_string(), position);
        inner.dirty = true;
    }

    /// Stored position for `item`, or 0 if it was never set.
    pub fn get(&self, item: &str) -> i64 {
        self.inner.read().entries.get(item).copied().unwrap_or(0)
    }

    /// Copy of the entries if anything changed since the last snapshot.
    ///
    /// The copy and the dirty reset happen in one critical section, so a
    /// concurrent `set` either lands in this copy or re-dirties the store
    /// for the next cycle.
    pub fn snapshot(&self) -> Option<Bookmarks> {
        let mut inner = self.inner.write();
        if !inner.dirty {
            return None;
        }
        inner.dirty = false;
        Some(inner.entries.clone())
    }

    /// Flag unsaved changes again, used when a captured snapshot failed to reach disk.
    pub fn mark_dirty(&self) {
        self.inner.write().dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.read().dirty
    }

    /// Copy of the current entries. Leaves the dirty flag alone.
    pub fn entries(&self) -> Bookmarks {
        self.inner.read().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Replace the entries with a persisted snapshot.
    ///
    /// Bad or `null` input leaves the store as it was. Returns whether the
    /// entries were replaced.
    pub fn load_from(&self, bytes: &[u8]) -> bool {
        let parsed: Option<Bookmarks> = match serde_json::from_slice(bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("[BOOKMARKS] Ignoring unreadable snapshot: {}", e);
                return false;
            }
        };
        let Some(entries) = parsed else {
            return false;
        };

        let mut inner = self.inner.write();
        inner.entries = entries;
        inner.dirty = false;
        true
    }
}
