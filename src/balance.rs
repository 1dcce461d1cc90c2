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

//! Supplier balance reconciliation.
//!
//! Every figure is derived on demand from the order and transaction
//! collections; nothing is cached. The two activity windows are
//! intentionally different: `received_today` is aligned to the UTC
//! calendar day while `received_week` is a rolling 168-hour window. Both
//! are keyed on order *creation*, so they measure orders placed, not
//! funds released.

use crate::order::{Order, OrderStatus};
use crate::transaction::Transaction;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A supplier's financial position at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupplierBalance {
    /// Open orders not yet shipped.
    pub pending: usize,
    /// Value of every order not yet finalized (pending, sent, disputed).
    pub held_in_escrow: Decimal,
    /// Value of every finalized order.
    pub total_earned: Decimal,
    /// Withdrawals awaiting approval or already approved.
    pub total_committed: Decimal,
    /// `total_earned - total_committed`.
    pub available: Decimal,
    /// Value of orders created on the same UTC calendar day as `now`.
    pub received_today: Decimal,
    /// Value of orders created within the rolling week before `now`.
    pub received_week: Decimal,
}

/// Derives a supplier's balance from its orders and transactions.
///
/// Callers are responsible for handing in a consistent snapshot of both
/// collections, already filtered to one supplier.
pub(crate) fn reconcile<'a>(
    orders: impl Iterator<Item = &'a Order>,
    transactions: impl Iterator<Item = &'a Transaction>,
    now: DateTime<Utc>,
) -> SupplierBalance {
    let mut pending = 0usize;
    let mut held_in_escrow = Decimal::ZERO;
    let mut total_earned = Decimal::ZERO;
    let mut received_today = Decimal::ZERO;
    let mut received_week = Decimal::ZERO;

    let today = now.date_naive();
    let week_start = now - Duration::days(7);

    for order in orders {
        match order.status {
            OrderStatus::Pending => {
                pending += 1;
                held_in_escrow += order.value_foreign;
            }
            OrderStatus::Sent | OrderStatus::Dispute => {
                held_in_escrow += order.value_foreign;
            }
            OrderStatus::Finalized => {
                total_earned += order.value_foreign;
            }
        }
        if order.created_at.date_naive() == today {
            received_today += order.value_foreign;
        }
        if order.created_at > week_start {
            received_week += order.value_foreign;
        }
    }

    let mut total_committed = Decimal::ZERO;
    for transaction in transactions {
        if transaction.commits_funds() {
            total_committed += transaction.amount_foreign;
        }
    }

    debug_assert!(held_in_escrow >= Decimal::ZERO);
    debug_assert!(total_earned >= Decimal::ZERO);

    SupplierBalance {
        pending,
        held_in_escrow,
        total_earned,
        total_committed,
        available: total_earned - total_committed,
        received_today,
        received_week,
    }
}
