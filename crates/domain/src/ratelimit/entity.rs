/// Decision produced by the rate-limit gate for one outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Budget available: a slot was consumed, dispatch now.
    Dispatch,
    /// Budget exhausted: suspend for this many milliseconds, then re-gate.
    WaitMs(i64),
}

/// Server-advertised rate-limit window.
///
/// `limit` requests are permitted per window; `remaining` is decremented
/// optimistically on dispatch and restored when the reset point passes.
/// Updated from `X-RateLimit-*` headers on every response. Owned by the
/// gateway's single queue worker, so no lock is needed.
#[derive(Debug, Clone)]
pub struct RateLimitWindow {
    limit: u32,
    remaining: u32,
    reset_at_ms: Option<i64>,
    window_ms: i64,
}

impl RateLimitWindow {
    pub fn new(limit: u32, window_ms: i64) -> Self {
        Self {
            limit,
            remaining: limit,
            reset_at_ms: None,
            window_ms,
        }
    }

    /// Gate one request. Restores the budget when the reset point has
    /// passed; consumes a slot when one is available; otherwise reports how
    /// long to wait (until the advertised reset, or one default window when
    /// no reset is known).
    pub fn gate(&mut self, now_ms: i64) -> GateDecision {
        if let Some(reset_at) = self.reset_at_ms
            && now_ms >= reset_at
        {
            self.remaining = self.limit;
            self.reset_at_ms = None;
        }

        if self.remaining > 0 {
            self.remaining -= 1;
            return GateDecision::Dispatch;
        }

        let wait = match self.reset_at_ms {
            Some(reset_at) => (reset_at - now_ms).max(0),
            None => self.window_ms,
        };
        GateDecision::WaitMs(wait)
    }

    /// Ingest `X-RateLimit-Limit` / `-Remaining` / `-Reset` header values.
    /// `reset_ms` is a wait duration in milliseconds, anchored at `now_ms`.
    /// Absent headers leave the corresponding field untouched.
    pub fn observe(
        &mut self,
        limit: Option<u32>,
        remaining: Option<u32>,
        reset_ms: Option<i64>,
        now_ms: i64,
    ) {
        if let Some(limit) = limit {
            self.limit = limit;
        }
        if let Some(remaining) = remaining {
            self.remaining = remaining;
        }
        if let Some(reset_ms) = reset_ms {
            self.reset_at_ms = Some(now_ms + reset_ms.max(0));
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn reset_at_ms(&self) -> Option<i64> {
        self.reset_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_while_budget_remains() {
        let mut window = RateLimitWindow::new(2, 60_000);
        assert_eq!(window.gate(0), GateDecision::Dispatch);
        assert_eq!(window.gate(0), GateDecision::Dispatch);
        assert_eq!(window.remaining(), 0);
    }

    #[test]
    fn exhausted_budget_waits_for_advertised_reset() {
        let mut window = RateLimitWindow::new(1, 60_000);
        assert_eq!(window.gate(0), GateDecision::Dispatch);
        window.observe(Some(1), Some(0), Some(2_000), 0);
        assert_eq!(window.gate(500), GateDecision::WaitMs(1_500));
    }

    #[test]
    fn exhausted_budget_without_reset_waits_default_window() {
        let mut window = RateLimitWindow::new(1, 60_000);
        assert_eq!(window.gate(0), GateDecision::Dispatch);
        assert_eq!(window.gate(0), GateDecision::WaitMs(60_000));
    }

    #[test]
    fn budget_restores_after_reset_passes() {
        let mut window = RateLimitWindow::new(1, 60_000);
        assert_eq!(window.gate(0), GateDecision::Dispatch);
        window.observe(Some(1), Some(0), Some(1_000), 0);
        assert_eq!(window.gate(1_000), GateDecision::Dispatch);
    }

    #[test]
    fn observe_takes_server_values() {
        let mut window = RateLimitWindow::new(10, 60_000);
        window.observe(Some(100), Some(99), Some(30_000), 1_000);
        assert_eq!(window.remaining(), 99);
        assert_eq!(window.reset_at_ms(), Some(31_000));
    }

    #[test]
    fn partial_headers_leave_rest_untouched() {
        let mut window = RateLimitWindow::new(10, 60_000);
        window.observe(None, Some(3), None, 0);
        assert_eq!(window.remaining(), 3);
        assert_eq!(window.reset_at_ms(), None);
    }
}
