//! Ability timers: dash, charge and damage invulnerability
//!
//! Each timer is a flag plus wall-clock deadlines. `refresh(now)` flips the
//! flags once their deadlines pass, so a timer expires on real elapsed time
//! whether or not the game loop is ticking (pausing mid-dash does not extend
//! the dash).

use serde::{Deserialize, Serialize};

/// Dash: a short speed burst followed by a cooldown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dash {
    active: bool,
    ready: bool,
    ends_at: f64,
    ready_at: f64,
}

impl Default for Dash {
    fn default() -> Self {
        Self {
            active: false,
            ready: true,
            ends_at: 0.0,
            ready_at: 0.0,
        }
    }
}

impl Dash {
    /// Start a dash. Returns false (and changes nothing) while on cooldown.
    pub fn trigger(&mut self, now: f64, duration_ms: f64, cooldown_ms: f64) -> bool {
        self.refresh(now);
        if !self.ready {
            return false;
        }
        self.active = true;
        self.ready = false;
        self.ends_at = now + duration_ms;
        self.ready_at = now + duration_ms + cooldown_ms;
        true
    }

    pub fn refresh(&mut self, now: f64) {
        if self.active && now >= self.ends_at {
            self.active = false;
        }
        if !self.ready && now >= self.ready_at {
            self.ready = true;
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn can_dash(&self) -> bool {
        self.ready
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<f64> {
        if self.active {
            Some(self.ends_at)
        } else if !self.ready {
            Some(self.ready_at)
        } else {
            None
        }
    }
}

/// Hold-to-charge trigger state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    charging: bool,
    started_at: f64,
}

impl Charge {
    pub fn start(&mut self, now: f64) {
        self.charging = true;
        self.started_at = now;
    }

    /// Finish charging, returning how long the trigger was held.
    /// `None` if no charge was in progress.
    pub fn release(&mut self, now: f64) -> Option<f64> {
        if !self.charging {
            return None;
        }
        self.charging = false;
        Some((now - self.started_at).max(0.0))
    }

    pub fn cancel(&mut self) {
        self.charging = false;
    }

    #[inline]
    pub fn is_charging(&self) -> bool {
        self.charging
    }

    /// Fraction of `charge_time_ms` held so far (0..=1), for HUD feedback
    pub fn progress(&self, now: f64, charge_time_ms: f64) -> f32 {
        if !self.charging || charge_time_ms <= 0.0 {
            return 0.0;
        }
        ((now - self.started_at) / charge_time_ms).clamp(0.0, 1.0) as f32
    }
}

/// Post-hit invulnerability window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Invulnerability {
    active: bool,
    until: f64,
}

impl Invulnerability {
    pub fn grant(&mut self, now: f64, duration_ms: f64) {
        self.active = true;
        self.until = now + duration_ms;
    }

    pub fn refresh(&mut self, now: f64) {
        if self.active && now >= self.until {
            self.active = false;
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.active.then_some(self.until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_lifecycle() {
        let mut dash = Dash::default();
        assert!(dash.can_dash());

        assert!(dash.trigger(1000.0, 150.0, 450.0));
        assert!(dash.is_active());
        assert!(!dash.can_dash());
        assert_eq!(dash.next_deadline(), Some(1150.0));

        // Retrigger during cooldown is a no-op
        assert!(!dash.trigger(1100.0, 150.0, 450.0));
        assert_eq!(dash.next_deadline(), Some(1150.0));

        dash.refresh(1150.0);
        assert!(!dash.is_active());
        assert!(!dash.can_dash());
        assert_eq!(dash.next_deadline(), Some(1600.0));

        dash.refresh(1600.0);
        assert!(dash.can_dash());
        assert_eq!(dash.next_deadline(), None);
    }

    #[test]
    fn test_dash_expires_on_wall_clock() {
        // Nothing refreshes for a long time (game paused); the next refresh
        // must not see an extended dash.
        let mut dash = Dash::default();
        dash.trigger(0.0, 150.0, 450.0);
        dash.refresh(10_000.0);
        assert!(!dash.is_active());
        assert!(dash.can_dash());
    }

    #[test]
    fn test_charge_release() {
        let mut charge = Charge::default();
        assert_eq!(charge.release(50.0), None);

        charge.start(100.0);
        assert!(charge.is_charging());
        assert!((charge.progress(600.0, 1000.0) - 0.5).abs() < 1e-6);
        assert_eq!(charge.release(1300.0), Some(1200.0));
        assert!(!charge.is_charging());
        assert_eq!(charge.release(1400.0), None);
    }

    #[test]
    fn test_invulnerability_window() {
        let mut inv = Invulnerability::default();
        inv.grant(500.0, 1000.0);
        inv.refresh(1499.0);
        assert!(inv.is_active());
        inv.refresh(1500.0);
        assert!(!inv.is_active());
        assert_eq!(inv.next_deadline(), None);
    }
}
