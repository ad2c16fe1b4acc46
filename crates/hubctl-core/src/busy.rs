// Per-action busy flags.
//
// A counter per action rather than a bool: two overlapping toggles of
// the same device keep the flag up until both finish. Nothing here
// prevents concurrent requests.

use std::fmt;

use dashmap::DashMap;

/// A user-initiated operation that can be in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Login,
    SignUp,
    Refresh,
    Toggle(String),
    Onboard,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("login"),
            Self::SignUp => f.write_str("sign-up"),
            Self::Refresh => f.write_str("refresh"),
            Self::Toggle(id) => write!(f, "toggle {id}"),
            Self::Onboard => f.write_str("onboard"),
        }
    }
}

#[derive(Debug, Default)]
pub struct BusyTracker {
    in_flight: DashMap<Action, usize>,
}

impl BusyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `action` busy until the returned guard drops.
    pub fn begin(&self, action: Action) -> BusyGuard<'_> {
        *self.in_flight.entry(action.clone()).or_insert(0) += 1;
        BusyGuard {
            tracker: self,
            action,
        }
    }

    pub fn is_busy(&self, action: &Action) -> bool {
        self.in_flight.get(action).is_some_and(|n| *n > 0)
    }

    fn end(&self, action: &Action) {
        let emptied = self.in_flight.get_mut(action).is_some_and(|mut n| {
            *n = n.saturating_sub(1);
            *n == 0
        });
        if emptied {
            self.in_flight.remove_if(action, |_, n| *n == 0);
        }
    }
}

/// Clears one busy mark on drop, on success and failure alike.
#[must_use = "the action is only marked busy while the guard is alive"]
pub struct BusyGuard<'a> {
    tracker: &'a BusyTracker,
    action: Action,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.tracker.end(&self.action);
    }
}
