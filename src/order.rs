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

//! Orders and the order lifecycle.
//!
//! Implemented state machine:
//
//  Pending ──ship──► Sent ──finalize──► Finalized
//                      │                    │
//                      └──────dispute───────┴──► Dispute
//
//! Pending and Dispute never finalize; only finalization releases an
//! order's value to the supplier's available balance.

use crate::base::{OrderId, UserId};
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Sent,
    Finalized,
    Dispute,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Sent => "sent",
            OrderStatus::Finalized => "finalized",
            OrderStatus::Dispute => "dispute",
        };
        f.write_str(name)
    }
}

/// Shipment proof recorded when a supplier marks an order sent.
///
/// The tracking code and photos travel together: an order can never hold
/// one without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub tracking_code: String,
    /// Photo references (URLs or storage keys); the storage itself is
    /// external to the engine.
    pub photos: Vec<String>,
}

impl Shipment {
    fn validate(&self) -> Result<(), EngineError> {
        if self.tracking_code.trim().is_empty() {
            return Err(EngineError::EmptyTrackingCode);
        }
        if self.photos.is_empty() {
            return Err(EngineError::MissingShippingPhotos);
        }
        Ok(())
    }
}

/// A client's order against a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub client_id: UserId,
    pub supplier_id: UserId,
    pub description: String,
    /// Amount in the foreign currency. Immutable after creation; the
    /// local-currency total is recomputed at display time from the current
    /// rate and fee, never stored here.
    pub value_foreign: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub shipment: Option<Shipment>,
    pub dispute_reason: Option<String>,
}

impl Order {
    pub(crate) fn new(
        id: OrderId,
        client_id: UserId,
        supplier_id: UserId,
        description: String,
        value_foreign: Decimal,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        if description.trim().is_empty() {
            return Err(EngineError::EmptyDescription);
        }
        if value_foreign <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount);
        }
        Ok(Self {
            id,
            client_id,
            supplier_id,
            description,
            value_foreign,
            status: OrderStatus::Pending,
            created_at,
            shipment: None,
            dispute_reason: None,
        })
    }

    /// Records shipment proof and moves the order to [`OrderStatus::Sent`].
    ///
    /// Legal from Pending only. The shipment is validated before any field
    /// changes, so a failed call leaves the order untouched.
    pub(crate) fn mark_shipped(&mut self, shipment: Shipment) -> Result<(), EngineError> {
        shipment.validate()?;
        if self.status != OrderStatus::Pending {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                attempted: OrderStatus::Sent,
            });
        }
        self.shipment = Some(shipment);
        self.status = OrderStatus::Sent;
        Ok(())
    }

    /// Moves the order to [`OrderStatus::Dispute`], recording the reason.
    ///
    /// Legal from Sent or Finalized. Shipment data is kept.
    pub(crate) fn raise_dispute(&mut self, reason: String) -> Result<(), EngineError> {
        if reason.trim().is_empty() {
            return Err(EngineError::EmptyDisputeReason);
        }
        match self.status {
            OrderStatus::Sent | OrderStatus::Finalized => {
                self.dispute_reason = Some(reason);
                self.status = OrderStatus::Dispute;
                Ok(())
            }
            from => Err(EngineError::InvalidTransition {
                from,
                attempted: OrderStatus::Dispute,
            }),
        }
    }

    /// Moves the order to [`OrderStatus::Finalized`]. Legal from Sent only.
    pub(crate) fn finalize(&mut self) -> Result<(), EngineError> {
        if self.status != OrderStatus::Sent {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                attempted: OrderStatus::Finalized,
            });
        }
        self.status = OrderStatus::Finalized;
        Ok(())
    }
}
