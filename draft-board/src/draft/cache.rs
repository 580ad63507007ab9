// Time-boxed cache for the last computed board.
//
// One entry, keyed by draft id. Recomputation is idempotent and cheap, so
// racing callers after expiry would be acceptable; the mutex just avoids
// duplicate concurrent recomputation.

use crate::draft::service::BestAvailableBoard;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct CachedBoard {
    board: BestAvailableBoard,
    draft_id: String,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct BoardCache {
    inner: Mutex<Option<CachedBoard>>,
    ttl: Duration,
}

impl BoardCache {
    pub fn new(ttl: Duration) -> Self {
        BoardCache {
            inner: Mutex::new(None),
            ttl,
        }
    }

    /// The cached board for this draft id, if still fresh.
    pub fn get(&self, draft_id: &str) -> Option<BestAvailableBoard> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(cached)
                if cached.draft_id == draft_id && cached.stored_at.elapsed() < self.ttl =>
            {
                Some(cached.board.clone())
            }
            _ => None,
        }
    }

    pub fn set(&self, draft_id: &str, board: BestAvailableBoard) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(CachedBoard {
            board,
            draft_id: draft_id.to_string(),
            stored_at: Instant::now(),
        });
    }

    pub fn invalidate(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::service::BestAvailableBoard;

    fn empty_board() -> BestAvailableBoard {
        BestAvailableBoard::default()
    }

    #[test]
    fn get_returns_fresh_entry_for_same_draft() {
        let cache = BoardCache::new(Duration::from_secs(30));
        cache.set("draft-1", empty_board());
        assert!(cache.get("draft-1").is_some());
    }

    #[test]
    fn get_misses_for_different_draft_id() {
        let cache = BoardCache::new(Duration::from_secs(30));
        cache.set("draft-1", empty_board());
        assert!(cache.get("draft-2").is_none());
    }

    #[test]
    fn get_misses_after_ttl() {
        let cache = BoardCache::new(Duration::from_millis(0));
        cache.set("draft-1", empty_board());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("draft-1").is_none());
    }

    #[test]
    fn invalidate_clears_entry() {
        let cache = BoardCache::new(Duration::from_secs(30));
        cache.set("draft-1", empty_board());
        cache.invalidate();
        assert!(cache.get("draft-1").is_none());
    }

    #[test]
    fn empty_cache_misses() {
        let cache = BoardCache::new(Duration::from_secs(30));
        assert!(cache.get("draft-1").is_none());
    }
}
