//! Per-connection flood guard for websocket messages.
//!
//! Two sliding windows: a short burst window and a longer sustained one. A
//! message refused by either window never reaches a room.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::ConnectionConfig;

/// Sliding window counter
#[derive(Debug)]
pub struct RateWindow {
    /// Timestamps of recent messages
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl RateWindow {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Records a message at `now` if the window has room for it.
    pub fn check_at(&mut self, now: Instant) -> bool {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        if self.timestamps.len() >= self.max_requests {
            return false;
        }
        self.timestamps.push_back(now);
        true
    }

    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.timestamps.len())
    }
}

/// Which window refused a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodLimit {
    Burst,
    Sustained,
}

impl FloodLimit {
    pub fn label(self) -> &'static str {
        match self {
            Self::Burst => "burst",
            Self::Sustained => "sustained",
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Burst => "rate limit exceeded, slow down",
            Self::Sustained => "too many messages, wait before sending more",
        }
    }
}

#[derive(Debug)]
pub struct FloodGuard {
    burst: RateWindow,
    sustained: RateWindow,
}

impl FloodGuard {
    pub fn new(burst_limit: usize, sustained_limit: usize) -> Self {
        Self {
            burst: RateWindow::new(burst_limit, Duration::from_secs(1)),
            sustained: RateWindow::new(sustained_limit, Duration::from_secs(60)),
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(config.burst_limit, config.sustained_limit)
    }

    pub fn check(&mut self) -> Result<(), FloodLimit> {
        self.check_at(Instant::now())
    }

    /// A message refused by the burst window does not count against the
    /// sustained one.
    pub fn check_at(&mut self, now: Instant) -> Result<(), FloodLimit> {
        if !self.burst.check_at(now) {
            return Err(FloodLimit::Burst);
        }
        if !self.sustained.check_at(now) {
            return Err(FloodLimit::Sustained);
        }
        Ok(())
    }
}
