// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Per-budget aggregation.
//!
//! Totals are folded at full precision and rounded exactly once at the end
//! (reduce-then-round). Rounding per transaction would compound error across
//! the ledger, so no intermediate result is ever rounded.

use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary amounts carry two decimal places on the wire.
pub const MONEY_SCALE: u32 = 2;

/// Sum transaction amounts and round the final total to [`MONEY_SCALE`]
/// places, half away from zero.
pub fn total_of<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .sum::<Decimal>()
        .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
