//! Hold-to-commit timers and action debouncing.
//!
//! Destructive or state-mutating actions only commit after their triggering
//! gesture stays on the same target for a fixed duration.  One `HoldTimer`
//! per action kind tracks that; `DebounceGate` enforces a minimum gap
//! between accepted discrete actions so classifier jitter cannot fire
//! duplicates.

use std::collections::HashMap;

use tracing::debug;

// ── Hold timer ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum HoldState {
    Idle,
    Holding { target: String, start_ms: f64 },
    Cooldown { until_ms: f64 },
}

/// Outcome of feeding one frame to a hold timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldUpdate {
    /// No qualifying target, or the post-commit cooldown is active.
    Inactive,
    /// Hold in progress; value in [0, 1).
    Progress(f32),
    /// The hold just reached its full duration.  Fires exactly once.
    Committed,
}

/// Wall-clock hold-to-commit timer keyed by a target id.
///
/// The timer restarts whenever the target changes and goes inactive the
/// first frame the qualifying condition fails.  An optional cooldown after
/// a commit keeps the same continuous hold from firing twice.
#[derive(Debug, Clone)]
pub struct HoldTimer {
    duration_ms: f64,
    cooldown_ms: f64,
    state: HoldState,
}

impl HoldTimer {
    pub fn new(duration_ms: f64) -> Self {
        Self::with_cooldown(duration_ms, 0.0)
    }

    pub fn with_cooldown(duration_ms: f64, cooldown_ms: f64) -> Self {
        Self {
            duration_ms,
            cooldown_ms,
            state: HoldState::Idle,
        }
    }

    /// Advance the timer with this frame's target (or `None` when the
    /// qualifying condition failed).
    pub fn update(&mut self, target: Option<&str>, now_ms: f64) -> HoldUpdate {
        if let HoldState::Cooldown { until_ms } = self.state {
            if now_ms < until_ms {
                return HoldUpdate::Inactive;
            }
            self.state = HoldState::Idle;
        }

        let Some(target) = target else {
            self.state = HoldState::Idle;
            return HoldUpdate::Inactive;
        };

        let held_since = match &self.state {
            HoldState::Holding {
                target: held,
                start_ms,
            } if held == target => Some(*start_ms),
            _ => None,
        };

        match held_since {
            Some(start_ms) => {
                let progress = ((now_ms - start_ms) / self.duration_ms).min(1.0) as f32;
                if progress >= 1.0 {
                    debug!(target, "hold committed");
                    self.state = if self.cooldown_ms > 0.0 {
                        HoldState::Cooldown {
                            until_ms: now_ms + self.cooldown_ms,
                        }
                    } else {
                        HoldState::Idle
                    };
                    HoldUpdate::Committed
                } else {
                    HoldUpdate::Progress(progress)
                }
            }
            None => {
                self.state = HoldState::Holding {
                    target: target.to_string(),
                    start_ms: now_ms,
                };
                HoldUpdate::Progress(0.0)
            }
        }
    }

    /// Abort any hold in progress.  A running cooldown is kept so a commit
    /// cannot be re-armed by flickering the gesture off and on.
    pub fn clear(&mut self) {
        if matches!(self.state, HoldState::Holding { .. }) {
            self.state = HoldState::Idle;
        }
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.state, HoldState::Holding { .. })
    }
}

// ── Debounce gate ──────────────────────────────────────────

/// Minimum-gap filter for discrete actions, tracked per action kind.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    window_ms: f64,
    last_accept: HashMap<&'static str, f64>,
}

impl DebounceGate {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            last_accept: HashMap::new(),
        }
    }

    /// Accept an action of `kind` at `now_ms` unless one of the same kind
    /// was accepted within the window.
    pub fn try_accept(&mut self, kind: &'static str, now_ms: f64) -> bool {
        match self.last_accept.get(kind) {
            Some(&t) if now_ms - t < self.window_ms => {
                debug!(kind, "action debounced");
                false
            }
            _ => {
                self.last_accept.insert(kind, now_ms);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_accept.clear();
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_progress_is_monotonic() {
        let mut hold = HoldTimer::new(1000.0);
        let mut last = -1.0f32;
        for t in [0.0, 100.0, 400.0, 700.0, 999.0] {
            match hold.update(Some("lamp_1"), t) {
                HoldUpdate::Progress(p) => {
                    assert!(p >= last, "progress regressed: {p} < {last}");
                    last = p;
                }
                other => panic!("unexpected update {other:?}"),
            }
        }
        assert_eq!(hold.update(Some("lamp_1"), 1000.0), HoldUpdate::Committed);
    }

    #[test]
    fn test_hold_restarts_on_target_change() {
        let mut hold = HoldTimer::new(1000.0);
        hold.update(Some("lamp_1"), 0.0);
        hold.update(Some("lamp_1"), 900.0);
        // Different target at 950ms: clock restarts, no inherited progress.
        assert_eq!(
            hold.update(Some("battery_1"), 950.0),
            HoldUpdate::Progress(0.0)
        );
        assert_ne!(
            hold.update(Some("battery_1"), 1100.0),
            HoldUpdate::Committed
        );
    }

    #[test]
    fn test_hold_resets_when_condition_fails() {
        let mut hold = HoldTimer::new(1000.0);
        hold.update(Some("lamp_1"), 0.0);
        hold.update(Some("lamp_1"), 500.0);
        assert_eq!(hold.update(None, 533.0), HoldUpdate::Inactive);
        assert!(!hold.is_holding());
        // Re-supplying the target starts from zero.
        assert_eq!(hold.update(Some("lamp_1"), 566.0), HoldUpdate::Progress(0.0));
    }

    #[test]
    fn test_commit_once_with_cooldown() {
        let mut hold = HoldTimer::with_cooldown(1000.0, 1000.0);
        hold.update(Some("switch_1"), 0.0);
        assert_eq!(hold.update(Some("switch_1"), 1000.0), HoldUpdate::Committed);

        // Continuing to satisfy the condition inside the cooldown does
        // nothing, even across a gesture flicker.
        assert_eq!(hold.update(Some("switch_1"), 1100.0), HoldUpdate::Inactive);
        hold.clear();
        assert_eq!(hold.update(Some("switch_1"), 1500.0), HoldUpdate::Inactive);

        // After the cooldown a fresh hold is required for the next commit.
        assert_eq!(
            hold.update(Some("switch_1"), 2100.0),
            HoldUpdate::Progress(0.0)
        );
        assert_eq!(hold.update(Some("switch_1"), 3100.0), HoldUpdate::Committed);
    }

    #[test]
    fn test_commit_without_cooldown_goes_idle() {
        let mut hold = HoldTimer::new(500.0);
        hold.update(Some("lamp_1"), 0.0);
        assert_eq!(hold.update(Some("lamp_1"), 500.0), HoldUpdate::Committed);
        // No cooldown: the next frame starts a new hold immediately.
        assert_eq!(hold.update(Some("lamp_1"), 533.0), HoldUpdate::Progress(0.0));
    }

    #[test]
    fn test_debounce_suppresses_within_window() {
        let mut gate = DebounceGate::new(100.0);
        assert!(gate.try_accept("toggle", 0.0));
        assert!(!gate.try_accept("toggle", 50.0));
        assert!(gate.try_accept("toggle", 150.0));
    }

    #[test]
    fn test_debounce_is_per_kind() {
        let mut gate = DebounceGate::new(100.0);
        assert!(gate.try_accept("toggle", 0.0));
        // A different action kind is not suppressed by the toggle.
        assert!(gate.try_accept("add_direct", 10.0));
        assert!(!gate.try_accept("add_direct", 60.0));
    }
}
