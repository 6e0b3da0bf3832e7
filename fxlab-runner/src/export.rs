//! Trade tape export for external analysis tools.

use std::path::Path;

use anyhow::{Context, Result};

use fxlab_core::domain::BacktestTradeResult;

/// Serialize simulated trades as CSV.
///
/// Columns: time, symbol, side, outcome, entry_time, entry_price, exit_time,
/// exit_price, pnl_pips, r_multiple, r_multiple_scaled, risk_multiplier,
/// session_state, market_regime, setup_type, confluence, probability, reason
pub fn trades_to_csv(trades: &[BacktestTradeResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "time",
        "symbol",
        "side",
        "outcome",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "pnl_pips",
        "r_multiple",
        "r_multiple_scaled",
        "risk_multiplier",
        "session_state",
        "market_regime",
        "setup_type",
        "confluence",
        "probability",
        "reason",
    ])?;

    for t in trades {
        let c = &t.candidate;
        let probability = c
            .meta
            .scoring
            .as_ref()
            .map(|s| format!("{:.6}", s.probability))
            .unwrap_or_default();
        wtr.write_record([
            &c.time.to_rfc3339(),
            &c.symbol,
            &format!("{:?}", c.side).to_lowercase(),
            &format!("{:?}", t.outcome).to_lowercase(),
            &t.entry_fill.time.to_rfc3339(),
            &format!("{:.5}", t.entry_fill.price),
            &t.exit_fill.time.to_rfc3339(),
            &format!("{:.5}", t.exit_fill.price),
            &format!("{:.2}", t.pnl_pips),
            &format!("{:.4}", t.r_multiple),
            &format!("{:.4}", t.r_multiple_scaled),
            &format!("{:.4}", t.risk_multiplier),
            &format!("{:?}", t.session_state).to_lowercase(),
            &format!("{:?}", t.market_regime).to_lowercase(),
            &format!("{:?}", c.meta.setup_type).to_lowercase(),
            &format!("{:.4}", c.confluence_score),
            &probability,
            &c.reason,
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush trade CSV")?;
    String::from_utf8(bytes).context("trade CSV is not valid UTF-8")
}

/// Write the trade tape to a file.
pub fn export_trades_csv(trades: &[BacktestTradeResult], path: &Path) -> Result<()> {
    let csv = trades_to_csv(trades)?;
    std::fs::write(path, csv)
        .with_context(|| format!("failed to write trades to {}", path.display()))?;
    tracing::info!(path = %path.display(), trades = trades.len(), "exported trade tape");
    Ok(())
}
