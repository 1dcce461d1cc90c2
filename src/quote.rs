// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Currency conversion quotes.
//!
//! A quote converts a foreign-currency amount into the local currency and
//! applies the client's service fee. Quotes are never persisted: orders
//! store only the foreign value, and every display recomputes against the
//! current rate and the client's current fee, which may differ from the
//! values in effect when the order was created.

use crate::error::EngineError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Service fee applied when a client has no stored override.
pub const DEFAULT_FEE_PERCENT: Decimal = dec!(5);

/// Breakdown of what a client owes for a foreign-currency amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    /// Foreign amount converted at the given rate.
    pub local_base: Decimal,
    /// Service fee charged on top of the converted amount.
    pub fee_amount: Decimal,
    /// `local_base + fee_amount`.
    pub total_payable: Decimal,
}

/// Computes the local-currency total for `amount_foreign`.
///
/// Pure; the same function backs every quote display and the order
/// creation flow.
///
/// # Errors
///
/// - [`EngineError::InvalidAmount`] - `amount_foreign` is zero or negative.
/// - [`EngineError::InvalidRate`] - `exchange_rate` is zero or negative.
/// - [`EngineError::InvalidFee`] - `fee_percent` is negative.
///
/// # Example
///
/// ```
/// use cambio_rs::quote;
/// use rust_decimal_macros::dec;
///
/// let q = quote(dec!(1000), dec!(0.75), dec!(5)).unwrap();
/// assert_eq!(q.local_base, dec!(750.00));
/// assert_eq!(q.fee_amount, dec!(37.5000));
/// assert_eq!(q.total_payable, dec!(787.5000));
/// ```
pub fn quote(
    amount_foreign: Decimal,
    exchange_rate: Decimal,
    fee_percent: Decimal,
) -> Result<Quote, EngineError> {
    if amount_foreign <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount);
    }
    if exchange_rate <= Decimal::ZERO {
        return Err(EngineError::InvalidRate);
    }
    if fee_percent < Decimal::ZERO {
        return Err(EngineError::InvalidFee);
    }

    let local_base = amount_foreign * exchange_rate;
    let fee_amount = local_base * fee_percent / dec!(100);
    Ok(Quote {
        local_base,
        fee_amount,
        total_payable: local_base + fee_amount,
    })
}
