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

//! Ledger transactions and the withdrawal approval workflow.
//!
//! Withdrawals follow a state machine:
//! - `Pending` → `Approved` (admin records the payout)
//! - `Pending` → `Rejected` (admin declines; earmarked funds return)
//!
//! A resolved transaction is never mutated again and never deleted.

use crate::base::{TransactionId, UserId};
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Supplier payout request.
    Withdrawal,
    /// Income posting. The engine derives supplier income directly from
    /// finalized orders and never creates rows of this kind; it exists for
    /// embedding layers that materialize income separately.
    Income,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// A ledger transaction against a supplier's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub supplier_id: UserId,
    /// Amount in the foreign currency.
    pub amount_foreign: Decimal,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub date: DateTime<Utc>,
}

impl Transaction {
    /// Creates a pending withdrawal request.
    pub(crate) fn withdrawal(
        id: TransactionId,
        supplier_id: UserId,
        amount_foreign: Decimal,
        date: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        if amount_foreign <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount);
        }
        Ok(Self {
            id,
            supplier_id,
            amount_foreign,
            kind: TransactionKind::Withdrawal,
            status: TransactionStatus::Pending,
            date,
        })
    }

    /// Marks the withdrawal approved. Approval is the only payout record
    /// the system keeps; no money moves here.
    pub(crate) fn approve(&mut self) -> Result<(), EngineError> {
        self.resolve(TransactionStatus::Approved)
    }

    /// Marks the withdrawal rejected, releasing the earmarked funds.
    pub(crate) fn reject(&mut self) -> Result<(), EngineError> {
        self.resolve(TransactionStatus::Rejected)
    }

    fn resolve(&mut self, to: TransactionStatus) -> Result<(), EngineError> {
        if self.status != TransactionStatus::Pending {
            return Err(EngineError::AlreadyResolved {
                status: self.status,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Whether this transaction earmarks funds against the supplier's
    /// available balance. A pending request already commits the funds;
    /// only a rejection releases them.
    pub fn commits_funds(&self) -> bool {
        self.kind == TransactionKind::Withdrawal
            && matches!(
                self.status,
                TransactionStatus::Pending | TransactionStatus::Approved
            )
    }
}
