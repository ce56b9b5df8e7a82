//! Order money computation
//!
//! 金额在下单时计算一次并持久化，之后不再重算。

use rust_decimal::Decimal;
use shared::models::{OrderLine, ServiceChannel};

use crate::error::{AllocationError, AllocationResult};

/// Tax and fee settings, loaded from configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderSettings {
    /// Fraction, e.g. `0.16`
    pub tax_rate: Decimal,
    /// Flat fee for the delivery channel
    pub delivery_fee: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

/// subtotal = Σ line subtotals, tax = subtotal × rate, fee on delivery only
///
/// Amounts beyond the `Decimal` range are rejected as `InvalidQuantity`.
pub fn compute_totals(
    lines: &[OrderLine],
    channel: ServiceChannel,
    settings: &OrderSettings,
) -> AllocationResult<OrderTotals> {
    let subtotal = lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.subtotal))
        .ok_or(AllocationError::InvalidQuantity)?
        .round_dp(2);
    let tax = subtotal
        .checked_mul(settings.tax_rate)
        .ok_or(AllocationError::InvalidQuantity)?
        .round_dp(2);
    let delivery_fee = if channel.requires_address() {
        settings.delivery_fee.round_dp(2)
    } else {
        Decimal::ZERO
    };
    let total = subtotal
        .checked_add(tax)
        .and_then(|sum| sum.checked_add(delivery_fee))
        .ok_or(AllocationError::InvalidQuantity)?;
    Ok(OrderTotals {
        subtotal,
        tax,
        delivery_fee,
        total,
    })
}
