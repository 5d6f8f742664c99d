//! Rate limiting for the write path.
//!
//! [`RateLimiter`] is the capability the post writer consults. Its decision is
//! authoritative: check-and-record must be atomic per key in the backing
//! store. [`SlidingWindowLimiter`] is the in-process implementation; shared
//! backends live with the storage crates.

use std::{
  collections::VecDeque,
  convert::Infallible,
  future::Future,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
  time::Duration,
};

use dashmap::DashMap;
use tokio::time::Instant;

/// The outcome of one [`RateLimiter::limit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
  /// Whether the hit was admitted (and recorded).
  pub success:     bool,
  pub limit:       u32,
  /// Hits still available in the current window after this one.
  pub remaining:   u32,
  /// When rejected, how long until the oldest counted hit leaves the window.
  pub retry_after: Option<Duration>,
}

pub trait RateLimiter: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Record a hit for `key` if the window allows it.
  fn limit<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Decision, Self::Error>> + Send + 'a;
}

// ─── In-memory sliding log ───────────────────────────────────────────────────

/// Every this many calls, keys whose hits have all aged out are dropped.
const SWEEP_EVERY: u64 = 256;

/// Admits at most `max_requests` hits per key in any trailing `window`.
///
/// State lives in this process only; cloning shares it. Idle keys are swept
/// periodically, so memory tracks the set of recently active keys.
#[derive(Debug, Clone)]
pub struct SlidingWindowLimiter {
  max_requests: u32,
  window:       Duration,
  hits:         Arc<DashMap<String, VecDeque<Instant>>>,
  calls:        Arc<AtomicU64>,
}

impl SlidingWindowLimiter {
  pub fn new(max_requests: u32, window: Duration) -> Self {
    Self {
      max_requests,
      window,
      hits: Arc::new(DashMap::new()),
      calls: Arc::new(AtomicU64::new(0)),
    }
  }

  /// Drop every key with no hits left in the window.
  pub fn purge_expired(&self) {
    self.purge_expired_at(Instant::now());
  }

  fn purge_expired_at(&self, now: Instant) {
    let window = self.window;
    self.hits.retain(|_, hits| {
      prune(hits, now, window);
      !hits.is_empty()
    });
  }

  fn check(&self, key: &str, now: Instant) -> Decision {
    // Sweep before taking the entry guard; `retain` locks every shard.
    if self.calls.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY
      == SWEEP_EVERY - 1
    {
      self.purge_expired_at(now);
    }

    // The entry guard holds the shard lock, so prune-count-push is atomic.
    let mut entry = self.hits.entry(key.to_owned()).or_default();
    prune(&mut entry, now, self.window);

    let used = entry.len() as u32;
    if used >= self.max_requests {
      let retry_after = entry
        .front()
        .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)));
      return Decision {
        success: false,
        limit: self.max_requests,
        remaining: 0,
        retry_after,
      };
    }

    entry.push_back(now);
    Decision {
      success:     true,
      limit:       self.max_requests,
      remaining:   self.max_requests - used - 1,
      retry_after: None,
    }
  }
}

fn prune(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
  while let Some(oldest) = hits.front() {
    if now.duration_since(*oldest) >= window {
      hits.pop_front();
    } else {
      break;
    }
  }
}

impl RateLimiter for SlidingWindowLimiter {
  type Error = Infallible;

  async fn limit(&self, key: &str) -> Result<Decision, Infallible> {
    Ok(self.check(key, Instant::now()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn limiter() -> SlidingWindowLimiter {
    SlidingWindowLimiter::new(3, Duration::from_secs(60))
  }

  #[tokio::test(start_paused = true)]
  async fn fourth_hit_in_window_is_rejected() {
    let l = limiter();
    for expected_remaining in [2, 1, 0] {
      let d = l.limit("alice").await.unwrap();
      assert!(d.success);
      assert_eq!(d.remaining, expected_remaining);
    }

    let d = l.limit("alice").await.unwrap();
    assert!(!d.success);
    assert_eq!(d.remaining, 0);
    assert_eq!(d.retry_after, Some(Duration::from_secs(60)));
  }

  #[tokio::test(start_paused = true)]
  async fn keys_do_not_share_budget() {
    let l = limiter();
    for _ in 0..3 {
      assert!(l.limit("alice").await.unwrap().success);
    }
    assert!(l.limit("bob").await.unwrap().success);
    assert!(!l.limit("alice").await.unwrap().success);
  }

  #[tokio::test(start_paused = true)]
  async fn window_slides_hit_by_hit() {
    let l = limiter();
    assert!(l.limit("alice").await.unwrap().success);
    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(l.limit("alice").await.unwrap().success);
    assert!(l.limit("alice").await.unwrap().success);

    let d = l.limit("alice").await.unwrap();
    assert!(!d.success);
    assert_eq!(d.retry_after, Some(Duration::from_secs(30)));

    // The first hit ages out; only one slot frees up.
    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(l.limit("alice").await.unwrap().success);
    assert!(!l.limit("alice").await.unwrap().success);
  }

  #[tokio::test(start_paused = true)]
  async fn rejected_hits_are_not_recorded() {
    let l = limiter();
    for _ in 0..3 {
      l.limit("alice").await.unwrap();
    }
    for _ in 0..5 {
      assert!(!l.limit("alice").await.unwrap().success);
    }

    tokio::time::advance(Duration::from_secs(60)).await;
    let d = l.limit("alice").await.unwrap();
    assert!(d.success);
    assert_eq!(d.remaining, 2);
  }

  #[tokio::test(start_paused = true)]
  async fn purge_drops_idle_keys() {
    let l = limiter();
    l.limit("alice").await.unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    l.limit("bob").await.unwrap();

    tokio::time::advance(Duration::from_secs(30)).await;
    l.purge_expired();
    assert!(!l.hits.contains_key("alice"));
    assert_eq!(l.hits.get("bob").map(|h| h.len()), Some(1));

    tokio::time::advance(Duration::from_secs(30)).await;
    l.purge_expired();
    assert!(l.hits.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn idle_keys_are_swept_during_traffic() {
    let l = SlidingWindowLimiter::new(u32::MAX, Duration::from_secs(60));
    l.limit("stale").await.unwrap();
    tokio::time::advance(Duration::from_secs(60)).await;

    for _ in 1..SWEEP_EVERY - 1 {
      l.limit("fresh").await.unwrap();
    }
    assert!(l.hits.contains_key("stale"));

    l.limit("fresh").await.unwrap();
    assert!(!l.hits.contains_key("stale"));
    assert!(l.hits.contains_key("fresh"));
  }
}
