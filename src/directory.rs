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

//! User directory: supplier code resolution, approval flags, fee overrides.
//!
//! Users are owned by the embedding service. The engine consumes the
//! read-only [`Directory`] view; administrative mutations (supplier
//! approval, fee overrides, code regeneration) live on the concrete
//! [`InMemoryDirectory`] and only their effects are visible through the
//! trait.

use crate::base::{SupplierCode, UserId};
use crate::error::EngineError;
use crate::quote::DEFAULT_FEE_PERCENT;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Client,
    Supplier,
    Admin,
}

/// Directory record for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub role: UserRole,
    /// Public six-digit code; suppliers only.
    pub short_code: Option<SupplierCode>,
    /// Suppliers start unapproved; an admin flips this. Other roles are
    /// approved on registration.
    pub is_approved: bool,
    /// Per-client fee override; [`DEFAULT_FEE_PERCENT`] applies when absent.
    pub fee_percentage: Option<Decimal>,
}

/// Read-only view of the directory consumed by the engine.
pub trait Directory: Send + Sync {
    /// Resolves a supplier's public code to the internal identity.
    fn resolve_supplier_by_code(&self, code: &SupplierCode) -> Option<UserId>;

    /// Whether the supplier has been approved by an admin.
    fn is_supplier_approved(&self, supplier_id: UserId) -> bool;

    /// The fee percentage for a client: the stored override, or the
    /// process-wide default.
    fn client_fee_percent(&self, client_id: UserId) -> Decimal;
}

/// In-memory directory.
///
/// Short codes are claimed through the map entry API, so two suppliers can
/// never end up holding the same code even under concurrent registration.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: DashMap<UserId, User>,
    /// Claimed codes, mapping back to the owning supplier.
    codes: DashMap<SupplierCode, UserId>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client, optionally with a fee override.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidFee`] - the override is negative.
    /// - [`EngineError::DuplicateUser`] - the id is already registered.
    pub fn register_client(
        &self,
        id: UserId,
        fee_percentage: Option<Decimal>,
    ) -> Result<(), EngineError> {
        if fee_percentage.is_some_and(|fee| fee < Decimal::ZERO) {
            return Err(EngineError::InvalidFee);
        }
        self.insert_user(User {
            id,
            role: UserRole::Client,
            short_code: None,
            is_approved: true,
            fee_percentage,
        })
    }

    /// Registers a supplier under a freshly generated code.
    ///
    /// Suppliers start unapproved; they can receive orders immediately but
    /// an admin must approve them before their dashboard opens up.
    pub fn register_supplier(&self, id: UserId) -> Result<SupplierCode, EngineError> {
        let code = self.claim_fresh_code(id);
        match self.insert_supplier(id, code.clone()) {
            Ok(()) => Ok(code),
            Err(e) => {
                self.codes.remove(&code);
                Err(e)
            }
        }
    }

    /// Registers a supplier under an explicit code (import/fixture path).
    ///
    /// # Errors
    ///
    /// - [`EngineError::DuplicateCode`] - the code belongs to another
    ///   supplier.
    /// - [`EngineError::DuplicateUser`] - the id is already registered.
    pub fn register_supplier_with_code(
        &self,
        id: UserId,
        code: SupplierCode,
    ) -> Result<(), EngineError> {
        self.claim_code(code.clone(), id)?;
        match self.insert_supplier(id, code.clone()) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.codes.remove(&code);
                Err(e)
            }
        }
    }

    /// Registers an admin.
    pub fn register_admin(&self, id: UserId) -> Result<(), EngineError> {
        self.insert_user(User {
            id,
            role: UserRole::Admin,
            short_code: None,
            is_approved: true,
            fee_percentage: None,
        })
    }

    /// Marks a supplier as approved.
    pub fn approve_supplier(&self, id: UserId) -> Result<(), EngineError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or(EngineError::SupplierNotFound)?;
        if user.role != UserRole::Supplier {
            return Err(EngineError::SupplierNotFound);
        }
        user.is_approved = true;
        Ok(())
    }

    /// Sets a client's fee override.
    pub fn set_client_fee(&self, id: UserId, fee: Decimal) -> Result<(), EngineError> {
        if fee < Decimal::ZERO {
            return Err(EngineError::InvalidFee);
        }
        let mut user = self.users.get_mut(&id).ok_or(EngineError::UserNotFound)?;
        user.fee_percentage = Some(fee);
        Ok(())
    }

    /// Issues a fresh code for a supplier and retires the old one.
    ///
    /// The internal identity is untouched, so existing orders and
    /// transactions keep working; only new orders need the new code.
    pub fn regenerate_code(&self, id: UserId) -> Result<SupplierCode, EngineError> {
        {
            let user = self.users.get(&id).ok_or(EngineError::SupplierNotFound)?;
            if user.role != UserRole::Supplier {
                return Err(EngineError::SupplierNotFound);
            }
        }
        let code = self.claim_fresh_code(id);
        let old = {
            let mut user = self
                .users
                .get_mut(&id)
                .ok_or(EngineError::SupplierNotFound)?;
            user.short_code.replace(code.clone())
        };
        if let Some(old) = old {
            self.codes.remove(&old);
        }
        Ok(code)
    }

    /// Snapshot of a user record.
    pub fn get(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|user| user.value().clone())
    }

    fn insert_supplier(&self, id: UserId, code: SupplierCode) -> Result<(), EngineError> {
        self.insert_user(User {
            id,
            role: UserRole::Supplier,
            short_code: Some(code),
            is_approved: false,
            fee_percentage: None,
        })
    }

    fn insert_user(&self, user: User) -> Result<(), EngineError> {
        // Entry API for atomic check-and-insert, matching the code claim.
        match self.users.entry(user.id) {
            Entry::Occupied(_) => Err(EngineError::DuplicateUser),
            Entry::Vacant(entry) => {
                entry.insert(user);
                Ok(())
            }
        }
    }

    fn claim_code(&self, code: SupplierCode, id: UserId) -> Result<(), EngineError> {
        match self.codes.entry(code) {
            Entry::Occupied(_) => Err(EngineError::DuplicateCode),
            Entry::Vacant(entry) => {
                entry.insert(id);
                Ok(())
            }
        }
    }

    fn claim_fresh_code(&self, id: UserId) -> SupplierCode {
        let mut rng = rand::thread_rng();
        loop {
            let code = SupplierCode::generate(&mut rng);
            if self.claim_code(code.clone(), id).is_ok() {
                return code;
            }
        }
    }
}

impl Directory for InMemoryDirectory {
    fn resolve_supplier_by_code(&self, code: &SupplierCode) -> Option<UserId> {
        self.codes.get(code).map(|entry| *entry)
    }

    fn is_supplier_approved(&self, supplier_id: UserId) -> bool {
        self.users
            .get(&supplier_id)
            .is_some_and(|user| user.role == UserRole::Supplier && user.is_approved)
    }

    fn client_fee_percent(&self, client_id: UserId) -> Decimal {
        self.users
            .get(&client_id)
            .and_then(|user| user.fee_percentage)
            .unwrap_or(DEFAULT_FEE_PERCENT)
    }
}
