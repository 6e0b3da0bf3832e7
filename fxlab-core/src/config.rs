//! Trading configuration.
//!
//! All thresholds and windows are configuration constants, not learned
//! values. The runner deserializes this from TOML; absent fields fall back
//! to the defaults below.

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Half-open local-time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub symbol: String,

    // Risk management
    pub risk_sl_pips: f64,
    pub min_rr: f64,
    pub max_signals_per_day: u32,
    pub max_spread_pips: f64,

    // Session windows in market-local time
    pub primary: TimeWindow,
    pub secondary: TimeWindow,
    /// Override windows for pairs containing CAD (NY-open driven).
    pub cad_primary: TimeWindow,
    pub cad_secondary: TimeWindow,

    // Operational
    pub max_hold_minutes: i64,
    pub allow_overnight: bool,
    /// Market-local timezone all windows and cutoffs are expressed in.
    pub timezone: Tz,
    pub day_end_cutoff: NaiveTime,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbol: "GBPUSD".to_string(),
            risk_sl_pips: 17.5,
            min_rr: 1.2,
            max_signals_per_day: 10,
            max_spread_pips: 2.5,
            primary: TimeWindow::new(hm(15, 30), hm(20, 30)),
            secondary: TimeWindow::new(hm(11, 30), hm(14, 30)),
            cad_primary: TimeWindow::new(hm(13, 0), hm(20, 30)),
            cad_secondary: TimeWindow::new(hm(11, 0), hm(13, 0)),
            max_hold_minutes: 6 * 60,
            allow_overnight: false,
            timezone: chrono_tz::Europe::London,
            day_end_cutoff: hm(21, 30),
        }
    }
}

impl TradingConfig {
    /// Session windows for a symbol: CAD pairs trade the NY-open windows.
    pub fn windows_for(&self, symbol: &str) -> (TimeWindow, TimeWindow) {
        if symbol.to_ascii_uppercase().contains("CAD") {
            (self.cad_primary, self.cad_secondary)
        } else {
            (self.primary, self.secondary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_half_open() {
        let w = TimeWindow::new(hm(15, 30), hm(20, 30));
        assert!(w.contains(hm(15, 30)));
        assert!(w.contains(hm(20, 29)));
        assert!(!w.contains(hm(20, 30)));
        assert!(!w.contains(hm(15, 29)));
    }

    #[test]
    fn cad_symbols_use_override_windows() {
        let cfg = TradingConfig::default();
        let (p, _) = cfg.windows_for("USDCAD");
        assert_eq!(p.start, hm(13, 0));
        let (p, _) = cfg.windows_for("GBPUSD");
        assert_eq!(p.start, hm(15, 30));
    }

    #[test]
    fn toml_roundtrip_with_defaults() {
        let cfg = TradingConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TradingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
        // Partial input falls back to defaults.
        let partial: TradingConfig = serde_json::from_str(r#"{"symbol":"EURUSD"}"#).unwrap();
        assert_eq!(partial.symbol, "EURUSD");
        assert_eq!(partial.risk_sl_pips, 17.5);
    }
}
