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

//! Error types for engine operations.

use crate::order::OrderStatus;
use crate::transaction::TransactionStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Engine operation errors.
///
/// Every failure is reported synchronously to the caller; the engine never
/// retries and never leaves a partial mutation visible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Amount is zero or negative
    #[error("amount must be positive")]
    InvalidAmount,

    /// Exchange rate is zero or negative
    #[error("exchange rate must be positive")]
    InvalidRate,

    /// Fee percentage is negative
    #[error("fee percentage cannot be negative")]
    InvalidFee,

    /// Order description is blank
    #[error("order description cannot be empty")]
    EmptyDescription,

    /// Shipment tracking code is blank
    #[error("tracking code cannot be empty")]
    EmptyTrackingCode,

    /// Shipment carries no photos
    #[error("at least one shipping photo is required")]
    MissingShippingPhotos,

    /// Dispute reason is blank
    #[error("dispute reason cannot be empty")]
    EmptyDisputeReason,

    /// Supplier code is not six ASCII digits
    #[error("supplier code must be six digits")]
    InvalidCode,

    /// Supplier code is already claimed
    #[error("supplier code already in use")]
    DuplicateCode,

    /// User id is already registered in the directory
    #[error("user already registered")]
    DuplicateUser,

    /// No supplier owns the referenced code, or the user is not a supplier
    #[error("supplier not found")]
    SupplierNotFound,

    /// Referenced user does not exist
    #[error("user not found")]
    UserNotFound,

    /// Referenced order does not exist
    #[error("order not found")]
    OrderNotFound,

    /// Referenced transaction does not exist
    #[error("transaction not found")]
    TransactionNotFound,

    /// Order state machine precondition violated
    #[error("cannot move order from {from} to {attempted}")]
    InvalidTransition {
        from: OrderStatus,
        attempted: OrderStatus,
    },

    /// Withdrawal was already approved or rejected
    #[error("withdrawal already {status}")]
    AlreadyResolved { status: TransactionStatus },

    /// Withdrawal exceeds the supplier's available balance
    #[error("requested {requested} but only {available} is available")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },
}
