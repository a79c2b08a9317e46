//! In-process denylist of revoked token identifiers.
//!
//! Entries live only until the revoked token would have expired anyway, so
//! the list is bounded by the number of logouts within one token lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use talent_core::clock::Clock;
use tokio::sync::RwLock;

/// Revoked `jti` values mapped to the `exp` of the token they belong to.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct TokenDenylist {
    entries: RwLock<HashMap<String, i64>>,
    clock: Arc<dyn Clock>,
}

impl TokenDenylist {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Revoke `jti` until `exp` (Unix seconds). Prunes expired entries.
    pub async fn revoke(&self, jti: &str, exp: i64) {
        let now = self.clock.now().timestamp();
        let mut entries = self.entries.write().await;
        entries.retain(|_, until| *until > now);
        if exp > now {
            entries.insert(jti.to_string(), exp);
        }
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        let now = self.clock.now().timestamp();
        self.entries
            .read()
            .await
            .get(jti)
            .is_some_and(|until| *until > now)
    }

    /// Number of entries currently held, including any not yet pruned.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use talent_core::clock::ManualClock;

    use super::*;

    #[tokio::test]
    async fn revoked_until_expiry_then_pruned() {
        let clock = Arc::new(ManualClock::starting_now());
        let denylist = TokenDenylist::new(clock.clone());
        let now = clock.now().timestamp();

        denylist.revoke("jti-1", now + 60).await;
        assert!(denylist.is_revoked("jti-1").await);
        assert!(!denylist.is_revoked("jti-2").await);

        clock.advance(TimeDelta::seconds(61));
        assert!(!denylist.is_revoked("jti-1").await);

        // The next revocation sweeps the stale entry out.
        denylist.revoke("jti-2", now + 3600).await;
        assert_eq!(denylist.len().await, 1);
        assert!(denylist.is_revoked("jti-2").await);
    }

    #[tokio::test]
    async fn already_expired_tokens_are_not_stored() {
        let clock = Arc::new(ManualClock::starting_now());
        let denylist = TokenDenylist::new(clock.clone());
        let now = clock.now().timestamp();

        denylist.revoke("old", now).await;
        assert!(denylist.is_empty().await);
    }
}
