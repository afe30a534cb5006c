// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Idle countdown used by the consumer loop.

use std::pin::Pin;
use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// Deadline used when `now + duration` does not fit in an `Instant` (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn deadline_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration).unwrap_or(now + FAR_FUTURE)
}

/// Single-shot countdown that fires once `duration` has passed since it was
/// started or last reset.
///
/// Resetting moves the deadline of the underlying [`Sleep`] in place, so an
/// expiry that was due before the reset can never be observed after it.
#[derive(Debug)]
pub struct IdleTimer {
    duration: Duration,
    sleep: Pin<Box<Sleep>>,
}

impl IdleTimer {
    /// Start a countdown of `duration` from now.
    pub fn start(duration: Duration) -> Self {
        Self {
            duration,
            sleep: Box::pin(tokio::time::sleep_until(deadline_after(duration))),
        }
    }

    /// Rearm a fresh full-duration countdown from now.
    pub fn reset(&mut self) {
        self.sleep.as_mut().reset(deadline_after(self.duration));
    }

    /// Wait until the countdown fires.
    ///
    /// Cancel-safe: dropping the future leaves the deadline untouched.
    pub async fn expired(&mut self) {
        self.sleep.as_mut().await;
    }

    pub fn is_elapsed(&self) -> bool {
        self.sleep.is_elapsed()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
