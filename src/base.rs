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

//! Core identifier types for users, orders, transactions, and supplier codes.

use crate::error::EngineError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a user (client, supplier, or admin).
///
/// User identities are assigned by the embedding service; the engine never
/// mints them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an order. Assigned by the engine at creation and
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ledger transaction. Assigned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A supplier's public six-digit code.
///
/// The code is what clients type when addressing an order; it maps to the
/// supplier's internal [`UserId`] and can be regenerated without touching
/// that identity. Orders and transactions always reference the internal id,
/// never the code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SupplierCode(String);

impl SupplierCode {
    /// Codes are exactly six ASCII digits.
    pub const LEN: usize = 6;

    /// Parses a code from caller input.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidCode`] unless the input is exactly six
    /// ASCII digits.
    pub fn new(code: impl Into<String>) -> Result<Self, EngineError> {
        let code = code.into();
        if code.len() != Self::LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::InvalidCode);
        }
        Ok(Self(code))
    }

    /// Draws a random code in the `100000..=999999` range.
    ///
    /// Uniqueness is not guaranteed here; the directory claims codes
    /// atomically and retries on collision.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self(rng.gen_range(100_000u32..1_000_000).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SupplierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
