//! Spacing between requests for distinct resources.
//!
//! Batch jobs walk a list of resources one after another against a shared
//! quota. The pacer makes each request for a *new* URL wait until a fixed
//! interval has passed since the previous request. Repeat attempts for the
//! same URL are governed by the retry backoff instead and are not paced.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};

pub struct Pacer {
    interval: Duration,
    last: Mutex<Option<(String, Instant)>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait, if needed, before issuing a request for `url`.
    pub async fn wait_turn(&self, url: &str) {
        let wait = {
            let mut last = self.last.lock();
            let now = Instant::now();
            let wait = match last.as_ref() {
                Some((previous, at)) if previous != url => {
                    (*at + self.interval).saturating_duration_since(now)
                }
                _ => Duration::ZERO,
            };
            *last = Some((url.to_string(), now + wait));
            wait
        };

        if !wait.is_zero() {
            tracing::debug!("Pacing request for {} by {:?}", url, wait);
            sleep(wait).await;
        }
    }
}
