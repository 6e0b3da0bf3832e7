//! Pip arithmetic for currency pairs.
//!
//! A pip is 0.0001 for standard pairs and 0.01 for JPY-quoted pairs.

/// Price increment of one pip for the given symbol.
pub fn pip_size(symbol: &str) -> f64 {
    if symbol.to_ascii_uppercase().ends_with("JPY") {
        0.01
    } else {
        0.0001
    }
}

/// Convert a price delta to pips.
pub fn price_to_pips(symbol: &str, price_delta: f64) -> f64 {
    price_delta / pip_size(symbol)
}

/// Convert pips to a price delta.
pub fn pips_to_price(symbol: &str, pips: f64) -> f64 {
    pips * pip_size(symbol)
}
