//! Deterministic run fingerprints.
//!
//! The generator promises byte-for-byte reproducible output for identical
//! inputs and configuration; the fingerprint makes that promise checkable.

use serde::Serialize;

use crate::config::TradingConfig;
use crate::domain::TradeCandidate;
use crate::error::CoreError;

#[derive(Serialize)]
struct FingerprintInput<'a> {
    config: &'a TradingConfig,
    candidates: &'a [TradeCandidate],
}

/// BLAKE3 hex digest over the canonical JSON of config + candidates.
pub fn candidate_fingerprint(
    cfg: &TradingConfig,
    candidates: &[TradeCandidate],
) -> Result<String, CoreError> {
    let input = FingerprintInput {
        config: cfg,
        candidates,
    };
    let bytes = serde_json::to_vec(&input).map_err(|_| CoreError::InvalidCandidate {
        reason: "candidate list is not serializable".to_string(),
    })?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::test_support::{candidate, quiet_series};
    use crate::domain::Side;
    use crate::regime::MarketRegime;

    #[test]
    fn identical_inputs_hash_identically() {
        let series = quiet_series(10);
        let cfg = TradingConfig::default();
        let cands = vec![
            candidate(&series, 2, Side::Buy, 15.0, 20.0, MarketRegime::Trend),
            candidate(&series, 5, Side::Sell, 15.0, 20.0, MarketRegime::Range),
        ];
        let a = candidate_fingerprint(&cfg, &cands).unwrap();
        let b = candidate_fingerprint(&cfg, &cands.clone()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn any_change_perturbs_the_hash() {
        let series = quiet_series(10);
        let cfg = TradingConfig::default();
        let cands = vec![candidate(&series, 2, Side::Buy, 15.0, 20.0, MarketRegime::Trend)];
        let base = candidate_fingerprint(&cfg, &cands).unwrap();

        let mut shifted = cands.clone();
        shifted[0].confluence_score += 0.5;
        assert_ne!(base, candidate_fingerprint(&cfg, &shifted).unwrap());

        let mut other_cfg = cfg.clone();
        other_cfg.risk_sl_pips = 20.0;
        assert_ne!(base, candidate_fingerprint(&other_cfg, &cands).unwrap());
    }
}
