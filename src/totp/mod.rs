//! TOTP refresh cycle
//!
//! Tracks seconds remaining in the current 30-second TOTP window and
//! refreshes the codes of every tracked item exactly at window rollover.
//! The cycle is an explicit cancellable task owned by its handle, never
//! ambient global state, so multiple views (or tests) never share one
//! timer. Remaining seconds are always recomputed from wall clock, so
//! the cycle self-corrects after any pause or suspension.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, RwLock};
use tokio::task::{JoinHandle, JoinSet};

use crate::client::PassClient;

/// TOTP rotation window in seconds.
pub const TOTP_PERIOD_SECS: u64 = 30;

/// Seconds remaining until the next window boundary, always in [1, 30].
pub fn seconds_remaining(unix_secs: u64) -> u64 {
    TOTP_PERIOD_SECS - (unix_secs % TOTP_PERIOD_SECS)
}

fn seconds_remaining_now() -> u64 {
    let unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    seconds_remaining(unix_secs)
}

/// Identity of a tracked item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub share_id: String,
    pub item_id: String,
}

/// Events emitted by the cycle. A fetch failure for one item emits
/// nothing for it, so the consumer keeps showing its last known code.
#[derive(Debug)]
pub enum TotpEvent {
    /// One-second countdown tick.
    Tick { seconds_left: u64 },
    /// Fresh code for one tracked item.
    Code { key: ItemKey, code: String },
}

/// Handle owning the recurring refresh task. Dropping the handle (or
/// calling `cancel`) stops the timer; there are no detached timers.
pub struct TotpCycle {
    handle: JoinHandle<()>,
}

impl TotpCycle {
    /// Spawn the cycle. `tracked` is the live set of displayed items
    /// with TOTP enabled; the consumer updates it as the view changes.
    pub fn spawn(
        client: Arc<PassClient>,
        tracked: Arc<RwLock<Vec<ItemKey>>>,
        events: mpsc::UnboundedSender<TotpEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let seconds_left = seconds_remaining_now();
                if events.send(TotpEvent::Tick { seconds_left }).is_err() {
                    // Consumer went away.
                    break;
                }
                if seconds_left == TOTP_PERIOD_SECS {
                    refresh_batch(&client, &tracked, &events).await;
                }
            }
        });
        Self { handle }
    }

    /// Stop the cycle.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for TotpCycle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Re-fetch all tracked codes concurrently. Failures degrade per item:
/// one item's failure does not cancel or fail the others.
async fn refresh_batch(
    client: &Arc<PassClient>,
    tracked: &Arc<RwLock<Vec<ItemKey>>>,
    events: &mpsc::UnboundedSender<TotpEvent>,
) {
    let keys = tracked.read().await.clone();
    if keys.is_empty() {
        return;
    }
    tracing::debug!(count = keys.len(), "totp window rolled over, refreshing codes");

    let mut batch = JoinSet::new();
    for key in keys {
        let client = Arc::clone(client);
        batch.spawn(async move {
            let code = client.get_totp_code(&key.share_id, &key.item_id).await;
            (key, code)
        });
    }

    while let Some(joined) = batch.join_next().await {
        match joined {
            Ok((key, Ok(code))) => {
                let _ = events.send(TotpEvent::Code { key, code });
            }
            Ok((key, Err(e))) => tracing::warn!(
                item = %key.item_id,
                error = %e,
                "totp refresh failed, keeping previous code"
            ),
            Err(e) => tracing::warn!(error = %e, "totp refresh task failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Store, CACHE_TTL};
    use crate::config::Config;
    use crate::runner::mock::MockRunner;
    use tempfile::TempDir;

    #[test]
    fn remaining_seconds_always_in_window_range() {
        for unix_secs in 0..1_000 {
            let left = seconds_remaining(unix_secs);
            assert!((1..=30).contains(&left), "out of range at {unix_secs}: {left}");
        }
    }

    #[test]
    fn rollover_fires_once_per_window() {
        // One simulated tick per second for three windows.
        let fires = (0u64..90)
            .filter(|s| seconds_remaining(*s) == TOTP_PERIOD_SECS)
            .count();
        assert_eq!(fires, 3);
    }

    #[test]
    fn boundary_values() {
        assert_eq!(seconds_remaining(0), 30);
        assert_eq!(seconds_remaining(1), 29);
        assert_eq!(seconds_remaining(29), 1);
        assert_eq!(seconds_remaining(30), 30);
    }

    fn test_client(tmp: &TempDir) -> (Arc<PassClient>, Arc<MockRunner>) {
        let runner = Arc::new(MockRunner::new());
        let store = Store::new(tmp.path().to_path_buf(), CACHE_TTL);
        let client = Arc::new(PassClient::new(Config::default(), runner.clone(), store));
        (client, runner)
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_emits_ticks_and_stops_on_cancel() {
        let tmp = TempDir::new().unwrap();
        let (client, _runner) = test_client(&tmp);
        let tracked = Arc::new(RwLock::new(Vec::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let cycle = TotpCycle::spawn(client, tracked, tx);

        let first = rx.recv().await.expect("tick expected");
        match first {
            TotpEvent::Tick { seconds_left } => assert!((1..=30).contains(&seconds_left)),
            other => panic!("unexpected event: {other:?}"),
        }

        cycle.cancel();
        // After cancellation the sender is dropped and the stream ends.
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn batch_refresh_degrades_per_item() {
        let tmp = TempDir::new().unwrap();
        let (client, runner) = test_client(&tmp);
        runner.respond(
            &["item", "totp", "--share-id", "s1", "--item-id", "ok", "--output", "json"],
            r#"{"totp":"222222"}"#,
        );
        runner.fail(
            &["item", "totp", "--share-id", "s1", "--item-id", "bad", "--output", "json"],
            crate::ErrorKind::NetworkError,
            "connection reset",
        );

        let tracked = Arc::new(RwLock::new(vec![
            ItemKey {
                share_id: "s1".into(),
                item_id: "ok".into(),
            },
            ItemKey {
                share_id: "s1".into(),
                item_id: "bad".into(),
            },
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();

        refresh_batch(&client, &tracked, &tx).await;
        drop(tx);

        let mut codes = Vec::new();
        while let Some(event) = rx.recv().await {
            if let TotpEvent::Code { key, code } = event {
                codes.push((key.item_id, code));
            }
        }
        // Only the healthy item produced a code; the failing one kept
        // its previous one by emitting nothing.
        assert_eq!(codes, vec![("ok".to_string(), "222222".to_string())]);
    }
}
