//! Alert debouncing and cooldown gating.
//!
//! Each incoming classified reading can trigger up to four kinds of
//! feedback, each with its own gating rule:
//!
//! - **Banner** -- edge-triggered on the severity level, no time gate. It
//!   must never stay silent about a *new* danger tier.
//! - **Physical alert** (screen flash + shake) -- Lethal only, 60 s
//!   cooldown, so noisy readings don't turn the device into a strobe.
//! - **Push notification** -- Critical only, 300 s cooldown, so a sensor
//!   oscillating around the boundary doesn't spam the user's device.
//! - **Motion cues** (wobble/pulse) -- every actionable reading, ungated;
//!   cosmetic reinforcement only.
//!
//! All timers live in an [`AlertDebouncer`] owned by one observing session.
//! Nothing here is shared between recipes or sessions, so one brew's noisy
//! probe can never eat another brew's cooldown window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::severity::{Reading, Severity};

/// Flash + shake suppression window.
pub const DEFAULT_PHYSICAL_COOLDOWN_SECS: i64 = 60;
/// Push notification suppression window.
pub const DEFAULT_PUSH_COOLDOWN_SECS: i64 = 5 * 60;

/// Secondary motion cue attached to an actionable reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionCue {
    /// Critical readings wobble the status badge.
    Wobble,
    /// Warning readings pulse it.
    Pulse,
}

/// What an observing session should do with a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AlertAction {
    /// Surface a banner for a newly entered danger tier.
    ShowBanner {
        level: Severity,
        title: String,
        message: String,
    },
    /// Flash the screen and shake the view. Lethal only.
    PhysicalAlert,
    /// Cosmetic badge motion. Fires on every actionable reading.
    MotionCue { cue: MotionCue },
    /// A push notification was dispatched for this reading.
    PushSent,
    /// Nothing was due for this reading.
    NoAction,
}

/// Per-session debounce state.
///
/// Created when a session starts observing a recipe's feed and discarded
/// when observation stops -- reopening a view re-arms the first banner and
/// both cooldown timers.
#[derive(Debug, Clone, Default)]
pub struct AlertState {
    /// Last level that triggered a banner. Edge detector, not a timer.
    last_level_shown: Option<Severity>,
    last_physical_at: Option<DateTime<Utc>>,
    last_push_at: Option<DateTime<Utc>>,
}

/// Decides which alert actions are due for each classified reading.
#[derive(Debug, Clone)]
pub struct AlertDebouncer {
    state: AlertState,
    physical_cooldown: Duration,
    push_cooldown: Duration,
}

impl Default for AlertDebouncer {
    fn default() -> Self {
        Self::new(
            Duration::seconds(DEFAULT_PHYSICAL_COOLDOWN_SECS),
            Duration::seconds(DEFAULT_PUSH_COOLDOWN_SECS),
        )
    }
}

impl AlertDebouncer {
    pub fn new(physical_cooldown: Duration, push_cooldown: Duration) -> Self {
        Self {
            state: AlertState::default(),
            physical_cooldown,
            push_cooldown,
        }
    }

    /// Evaluate one reading against the session's debounce state.
    ///
    /// Returns every action due for this reading, in a stable order:
    /// banner first, then physical alert, then motion cue, then push.
    /// A reading that triggers nothing yields a single [`AlertAction::NoAction`].
    ///
    /// The push decision consumes the cooldown window here; the caller is
    /// responsible for actually invoking the dispatcher when it sees
    /// [`AlertAction::PushSent`].
    pub fn observe(&mut self, reading: &Reading, now: DateTime<Utc>) -> Vec<AlertAction> {
        let mut actions = Vec::new();
        let level = reading.level;

        // Banner: fires on a change of actionable level. A non-actionable
        // reading clears the edge, so Warning -> Optimal -> Warning fires
        // twice.
        if level.is_actionable() {
            if self.state.last_level_shown != Some(level) {
                self.state.last_level_shown = Some(level);
                actions.push(AlertAction::ShowBanner {
                    level,
                    title: reading.title.to_string(),
                    message: reading.message.to_string(),
                });
            }
        } else {
            self.state.last_level_shown = None;
        }

        // Physical alert: level- and time-gated. Repeated Lethal readings
        // inside the window are suppressed even though each would satisfy
        // the banner's edge condition on its own.
        if level == Severity::Lethal && self.expired(self.state.last_physical_at, self.physical_cooldown, now) {
            self.state.last_physical_at = Some(now);
            actions.push(AlertAction::PhysicalAlert);
        }

        // Motion cues: ungated, purely cosmetic.
        match level {
            Severity::Critical => actions.push(AlertAction::MotionCue {
                cue: MotionCue::Wobble,
            }),
            Severity::Warning => actions.push(AlertAction::MotionCue {
                cue: MotionCue::Pulse,
            }),
            _ => {}
        }

        // Push: Critical only, long cooldown.
        if level == Severity::Critical && self.expired(self.state.last_push_at, self.push_cooldown, now) {
            self.state.last_push_at = Some(now);
            actions.push(AlertAction::PushSent);
        }

        if actions.is_empty() {
            actions.push(AlertAction::NoAction);
        }
        actions
    }

    /// Drop all debounce state, re-arming every gate.
    pub fn reset(&mut self) {
        self.state = AlertState::default();
    }

    fn expired(&self, last: Option<DateTime<Utc>>, cooldown: Duration, now: DateTime<Utc>) -> bool {
        match last {
            None => true,
            Some(t) => now - t > cooldown,
        }
    }
}
