//! Fee-adjusted profit computation for a matched buy/sell quote pair.

/// Gross and fee-adjusted profit ratios for one candidate, both expressed
/// as a fraction of the buy price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitBreakdown {
    /// Spread profit before trading fees. Diagnostic only; never gated on.
    pub gross_ratio: f64,
    /// Spread profit after both venues' trading fees.
    pub net_ratio: f64,
}

/// Compute profit ratios for buying at `buy_price` and selling at
/// `sell_price` with the given per-venue fee rates.
///
/// Returns `None` for degenerate inputs (`buy_price <= 0`) and for
/// non-positive spreads; an opportunity needs `sell_price > buy_price`
/// before fees even enter the picture.
pub fn compute(
    buy_price: f64,
    sell_price: f64,
    buy_fee_rate: f64,
    sell_fee_rate: f64,
) -> Option<ProfitBreakdown> {
    if buy_price <= 0.0 || sell_price <= buy_price {
        return None;
    }
    let gross_ratio = (sell_price - buy_price) / buy_price;
    let net_ratio =
        (sell_price * (1.0 - sell_fee_rate) - buy_price * (1.0 + buy_fee_rate)) / buy_price;
    Some(ProfitBreakdown {
        gross_ratio,
        net_ratio,
    })
}
