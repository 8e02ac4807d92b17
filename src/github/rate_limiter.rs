use reqwest::Response;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::time::sleep;

// Soft client-side ceiling, independent of GitHub's own quota.
const SOFT_REQUESTS_PER_MINUTE: u32 = 30;
const WINDOW: Duration = Duration::from_secs(60);

pub struct RateLimiter {
    state: Mutex<RateLimitState>,
}

struct RateLimitState {
    remaining: u32,
    reset_at: Option<Instant>,
    window_count: u32,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RateLimitState {
                remaining: 5000,
                reset_at: None,
                window_count: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Blocks the caller until the next request is allowed to go out.
    pub async fn wait(&self) {
        loop {
            let pause = match self.state.lock() {
                Ok(mut state) => Self::next_pause(&mut state),
                Err(_) => None,
            };

            match pause {
                Some(duration) => {
                    tracing::debug!("Rate limiting, pausing {:?}", duration);
                    sleep(duration).await;
                }
                None => break,
            }
        }
    }

    fn next_pause(state: &mut RateLimitState) -> Option<Duration> {
        let now = Instant::now();

        // Server-reported quota exhausted: hold until the reset timestamp.
        if state.remaining == 0 {
            if let Some(reset_at) = state.reset_at {
                if reset_at > now {
                    return Some(reset_at - now);
                }
            }
            state.remaining = 1;
            state.reset_at = None;
        }

        let elapsed = now.duration_since(state.window_start);
        if elapsed >= WINDOW {
            state.window_start = now;
            state.window_count = 0;
        } else if state.window_count >= SOFT_REQUESTS_PER_MINUTE {
            return Some(WINDOW - elapsed);
        }

        state.window_count += 1;
        None
    }

    pub fn update_from_response(&self, response: &Response) {
        let remaining: Option<u32> = header_value(response, "x-ratelimit-remaining");
        let reset: Option<u64> = header_value(response, "x-ratelimit-reset");

        let Some(remaining) = remaining else { return };
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        state.remaining = remaining;
        state.reset_at = reset.and_then(|reset_timestamp| {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .ok()?
                .as_secs();
            let wait_secs = reset_timestamp.checked_sub(now)?;
            Some(Instant::now() + Duration::from_secs(wait_secs))
        });
    }
}

fn header_value<T: std::str::FromStr>(response: &Response, name: &str) -> Option<T> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl RateLimiter {
    fn quota_remaining(&self) -> u32 {
        self.state.lock().unwrap().remaining
    }
}
