//! Session filter — pure local-time window classification.
//!
//! No calendar or holiday awareness: identical inputs always classify
//! identically. Windows are half-open `[start, end)` in the configured
//! market timezone, with PRIMARY checked before SECONDARY.

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::TradingConfig;

/// Tradability of a moment in time for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Primary,
    Secondary,
    Blocked,
}

/// Coarse global trading session, used as a model feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Session {
    Asia,
    London,
    NewYork,
    OffHours,
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Classify a UTC timestamp against the symbol's session windows.
pub fn session_state(time_utc: DateTime<Utc>, symbol: &str, cfg: &TradingConfig) -> SessionState {
    let local = time_utc.with_timezone(&cfg.timezone).time();
    let (primary, secondary) = cfg.windows_for(symbol);
    if primary.contains(local) {
        SessionState::Primary
    } else if secondary.contains(local) {
        SessionState::Secondary
    } else {
        SessionState::Blocked
    }
}

/// Coarse session plus whether the London/NY overlap is active.
pub fn infer_session(time_utc: DateTime<Utc>, tz: Tz) -> (Session, bool) {
    let t = time_utc.with_timezone(&tz).time();
    let overlap = hm(13, 0) <= t && t < hm(16, 0);
    let session = if t < hm(7, 0) {
        Session::Asia
    } else if t < hm(13, 0) {
        Session::London
    } else if t < hm(21, 0) {
        Session::NewYork
    } else {
        Session::OffHours
    };
    (session, overlap)
}

/// True when the local time-of-day has not passed the day-end cutoff.
pub fn within_day_cutoff(time_utc: DateTime<Utc>, tz: Tz, cutoff: NaiveTime) -> bool {
    let local = time_utc.with_timezone(&tz).time();
    // Compare on whole minutes so second-precision bars do not slip past.
    let local = hm(local.hour(), local.minute());
    local <= cutoff
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cfg() -> TradingConfig {
        TradingConfig::default()
    }

    fn jan_utc(h: u32, m: u32) -> DateTime<Utc> {
        // January: London local time equals UTC.
        Utc.with_ymd_and_hms(2024, 1, 2, h, m, 0).unwrap()
    }

    #[test]
    fn gbpusd_afternoon_is_primary() {
        assert_eq!(
            session_state(jan_utc(16, 30), "GBPUSD", &cfg()),
            SessionState::Primary
        );
    }

    #[test]
    fn gbpusd_midday_is_secondary() {
        assert_eq!(
            session_state(jan_utc(12, 30), "GBPUSD", &cfg()),
            SessionState::Secondary
        );
    }

    #[test]
    fn late_evening_is_blocked() {
        assert_eq!(
            session_state(jan_utc(22, 0), "GBPUSD", &cfg()),
            SessionState::Blocked
        );
    }

    #[test]
    fn usdcad_ny_open_is_primary() {
        // 13:30 London falls inside the CAD override primary window; for
        // non-CAD pairs it is still inside the secondary window.
        assert_eq!(
            session_state(jan_utc(13, 30), "USDCAD", &cfg()),
            SessionState::Primary
        );
        assert_eq!(
            session_state(jan_utc(13, 30), "GBPUSD", &cfg()),
            SessionState::Secondary
        );
        // Past the secondary close but before the primary open: blocked.
        assert_eq!(
            session_state(jan_utc(14, 45), "GBPUSD", &cfg()),
            SessionState::Blocked
        );
    }

    #[test]
    fn windows_are_half_open_at_boundaries() {
        assert_eq!(
            session_state(jan_utc(15, 30), "GBPUSD", &cfg()),
            SessionState::Primary
        );
        assert_eq!(
            session_state(jan_utc(20, 30), "GBPUSD", &cfg()),
            SessionState::Blocked
        );
    }

    #[test]
    fn summer_time_shifts_the_windows() {
        // 15:30 UTC in July is 16:30 London (BST): still primary.
        let t = Utc.with_ymd_and_hms(2024, 7, 2, 15, 30, 0).unwrap();
        assert_eq!(session_state(t, "GBPUSD", &cfg()), SessionState::Primary);
        // 20:00 UTC in July is 21:00 London: blocked.
        let t = Utc.with_ymd_and_hms(2024, 7, 2, 20, 0, 0).unwrap();
        assert_eq!(session_state(t, "GBPUSD", &cfg()), SessionState::Blocked);
    }

    #[test]
    fn session_inference() {
        let tz = chrono_tz::Europe::London;
        assert_eq!(infer_session(jan_utc(3, 0), tz), (Session::Asia, false));
        assert_eq!(infer_session(jan_utc(9, 0), tz), (Session::London, false));
        assert_eq!(infer_session(jan_utc(14, 0), tz), (Session::NewYork, true));
        assert_eq!(
            infer_session(jan_utc(22, 30), tz),
            (Session::OffHours, false)
        );
    }

    #[test]
    fn cutoff_is_inclusive() {
        let tz = chrono_tz::Europe::London;
        let cutoff = hm(21, 30);
        assert!(within_day_cutoff(jan_utc(21, 30), tz, cutoff));
        assert!(!within_day_cutoff(jan_utc(21, 31), tz, cutoff));
    }
}
