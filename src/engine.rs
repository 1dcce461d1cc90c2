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

//! Order processing engine.
//!
//! The [`Engine`] owns the order store and the transaction ledger and
//! enforces the lifecycle rules on every mutation. User identities come in
//! as explicit parameters on each call; the engine keeps no session state.
//!
//! # Consistency
//!
//! Both collections live behind a single `RwLock`. Every mutating
//! operation takes the write lock, so conflicting transitions serialize:
//! the second of two racing `mark_shipped` calls observes `Sent` and fails
//! with `InvalidTransition`. Balance reads take the read lock and observe
//! a point-in-time snapshot across orders and transactions.
//! [`Engine::request_withdrawal`] computes the available balance and
//! inserts the transaction inside one critical section, so concurrent
//! requests cannot jointly overdraw a supplier.
//!
//! # Invariants
//!
//! - Order status only moves Pending → Sent → Finalized, with Sent and
//!   Finalized able to branch to Dispute.
//! - A withdrawal is resolved (approved or rejected) at most once.
//! - `available = total_earned - total_committed` never goes negative
//!   through engine operations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::balance::{SupplierBalance, reconcile};
use crate::base::{OrderId, SupplierCode, TransactionId, UserId};
use crate::directory::{Directory, InMemoryDirectory};
use crate::error::EngineError;
use crate::order::{Order, Shipment};
use crate::quote::{Quote, quote};
use crate::transaction::Transaction;

/// Input for [`Engine::create_order`].
///
/// The supplier is addressed by public code; the engine resolves it to the
/// internal identity before the order is stored. No other order field can
/// be set through this struct.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub client_id: UserId,
    pub supplier_code: SupplierCode,
    pub description: String,
    pub value_foreign: Decimal,
}

/// Orders, transactions, and the per-supplier/per-client indexes.
///
/// Indexed lookups keep balance reads proportional to one supplier's
/// history instead of the whole table.
#[derive(Debug, Default)]
struct Ledger {
    orders: HashMap<OrderId, Order>,
    orders_by_client: HashMap<UserId, Vec<OrderId>>,
    orders_by_supplier: HashMap<UserId, Vec<OrderId>>,
    transactions: HashMap<TransactionId, Transaction>,
    transactions_by_supplier: HashMap<UserId, Vec<TransactionId>>,
    next_order_id: u64,
    next_transaction_id: u64,
}

impl Ledger {
    /// Balance figures for one supplier. The caller holds at least a read
    /// lock, so both collections come from one snapshot.
    fn balance_for(&self, supplier_id: UserId, now: DateTime<Utc>) -> SupplierBalance {
        let orders = self
            .orders_by_supplier
            .get(&supplier_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.orders.get(id));
        let transactions = self
            .transactions_by_supplier
            .get(&supplier_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.transactions.get(id));
        reconcile(orders, transactions, now)
    }
}

/// Order and withdrawal processor for the marketplace.
///
/// Generic over the [`Directory`] collaborator so embeddings can plug in
/// their own user store; defaults to [`InMemoryDirectory`].
pub struct Engine<D: Directory = InMemoryDirectory> {
    directory: Arc<D>,
    ledger: RwLock<Ledger>,
}

impl Engine {
    /// Creates an engine backed by a fresh [`InMemoryDirectory`].
    pub fn new() -> Self {
        Self::with_directory(Arc::new(InMemoryDirectory::new()))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Directory> Engine<D> {
    /// Creates an engine over an existing directory.
    pub fn with_directory(directory: Arc<D>) -> Self {
        Self {
            directory,
            ledger: RwLock::new(Ledger::default()),
        }
    }

    /// The directory collaborator this engine reads from.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Quotes `amount_foreign` at `exchange_rate` with the client's
    /// current fee.
    ///
    /// Nothing is stored: a later quote for the same order may use a
    /// different rate or fee.
    ///
    /// # Errors
    ///
    /// See [`quote`](crate::quote()).
    pub fn quote_for_client(
        &self,
        client_id: UserId,
        amount_foreign: Decimal,
        exchange_rate: Decimal,
    ) -> Result<Quote, EngineError> {
        quote(
            amount_foreign,
            exchange_rate,
            self.directory.client_fee_percent(client_id),
        )
    }

    /// Creates a Pending order addressed to the supplier owning
    /// `supplier_code`.
    ///
    /// Approval is not required to receive orders; an unapproved supplier
    /// simply cannot act on them yet.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SupplierNotFound`] - no supplier owns the code.
    /// - [`EngineError::EmptyDescription`] - blank description.
    /// - [`EngineError::InvalidAmount`] - `value_foreign` is not positive.
    pub fn create_order(&self, input: CreateOrder) -> Result<Order, EngineError> {
        let supplier_id = self
            .directory
            .resolve_supplier_by_code(&input.supplier_code)
            .ok_or(EngineError::SupplierNotFound)?;

        let mut ledger = self.ledger.write();
        let id = OrderId(ledger.next_order_id);
        let order = Order::new(
            id,
            input.client_id,
            supplier_id,
            input.description,
            input.value_foreign,
            Utc::now(),
        )?;
        ledger.next_order_id += 1;
        ledger
            .orders_by_client
            .entry(order.client_id)
            .or_default()
            .push(id);
        ledger
            .orders_by_supplier
            .entry(order.supplier_id)
            .or_default()
            .push(id);
        ledger.orders.insert(id, order.clone());
        Ok(order)
    }

    /// Records shipment proof and moves the order to Sent.
    ///
    /// Tracking code and photos are stored together or not at all.
    ///
    /// # Errors
    ///
    /// - [`EngineError::OrderNotFound`] - unknown order id.
    /// - [`EngineError::EmptyTrackingCode`] /
    ///   [`EngineError::MissingShippingPhotos`] - incomplete proof.
    /// - [`EngineError::InvalidTransition`] - order is not Pending.
    pub fn mark_shipped(
        &self,
        order_id: OrderId,
        shipment: Shipment,
    ) -> Result<Order, EngineError> {
        let mut ledger = self.ledger.write();
        let order = ledger
            .orders
            .get_mut(&order_id)
            .ok_or(EngineError::OrderNotFound)?;
        order.mark_shipped(shipment)?;
        Ok(order.clone())
    }

    /// Raises a dispute on a Sent or Finalized order.
    ///
    /// # Errors
    ///
    /// - [`EngineError::OrderNotFound`] - unknown order id.
    /// - [`EngineError::EmptyDisputeReason`] - blank reason.
    /// - [`EngineError::InvalidTransition`] - order is Pending or already
    ///   disputed.
    pub fn raise_dispute(
        &self,
        order_id: OrderId,
        reason: impl Into<String>,
    ) -> Result<Order, EngineError> {
        let mut ledger = self.ledger.write();
        let order = ledger
            .orders
            .get_mut(&order_id)
            .ok_or(EngineError::OrderNotFound)?;
        order.raise_dispute(reason.into())?;
        Ok(order.clone())
    }

    /// Finalizes a Sent order, releasing its value to the supplier's
    /// available balance. Invoked by the administrative workflow.
    ///
    /// # Errors
    ///
    /// - [`EngineError::OrderNotFound`] - unknown order id.
    /// - [`EngineError::InvalidTransition`] - order is not Sent.
    pub fn finalize(&self, order_id: OrderId) -> Result<Order, EngineError> {
        let mut ledger = self.ledger.write();
        let order = ledger
            .orders
            .get_mut(&order_id)
            .ok_or(EngineError::OrderNotFound)?;
        order.finalize()?;
        Ok(order.clone())
    }

    /// Creates a Pending withdrawal request for `amount`.
    ///
    /// The available balance is checked and the transaction inserted under
    /// one write-lock acquisition; a pending request immediately earmarks
    /// the funds.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidAmount`] - `amount` is not positive.
    /// - [`EngineError::InsufficientBalance`] - `amount` exceeds the
    ///   supplier's available balance at request time.
    pub fn request_withdrawal(
        &self,
        supplier_id: UserId,
        amount: Decimal,
    ) -> Result<Transaction, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount);
        }

        let mut ledger = self.ledger.write();
        let available = ledger.balance_for(supplier_id, Utc::now()).available;
        if amount > available {
            return Err(EngineError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        let id = TransactionId(ledger.next_transaction_id);
        let transaction = Transaction::withdrawal(id, supplier_id, amount, Utc::now())?;
        ledger.next_transaction_id += 1;
        ledger
            .transactions_by_supplier
            .entry(supplier_id)
            .or_default()
            .push(id);
        ledger.transactions.insert(id, transaction.clone());
        Ok(transaction)
    }

    /// Approves a pending withdrawal. The approval record is the system's
    /// only evidence of payout; the engine itself moves no money.
    ///
    /// # Errors
    ///
    /// - [`EngineError::TransactionNotFound`] - unknown transaction id.
    /// - [`EngineError::AlreadyResolved`] - already approved or rejected.
    pub fn approve_withdrawal(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Transaction, EngineError> {
        let mut ledger = self.ledger.write();
        let transaction = ledger
            .transactions
            .get_mut(&transaction_id)
            .ok_or(EngineError::TransactionNotFound)?;
        transaction.approve()?;
        Ok(transaction.clone())
    }

    /// Rejects a pending withdrawal, releasing the earmarked funds.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::approve_withdrawal`].
    pub fn reject_withdrawal(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Transaction, EngineError> {
        let mut ledger = self.ledger.write();
        let transaction = ledger
            .transactions
            .get_mut(&transaction_id)
            .ok_or(EngineError::TransactionNotFound)?;
        transaction.reject()?;
        Ok(transaction.clone())
    }

    /// All orders created by `client_id`, in creation order.
    pub fn orders_by_client(&self, client_id: UserId) -> Vec<Order> {
        let ledger = self.ledger.read();
        ledger
            .orders_by_client
            .get(&client_id)
            .into_iter()
            .flatten()
            .filter_map(|id| ledger.orders.get(id))
            .cloned()
            .collect()
    }

    /// All orders addressed to `supplier_id`, in creation order.
    pub fn orders_by_supplier(&self, supplier_id: UserId) -> Vec<Order> {
        let ledger = self.ledger.read();
        ledger
            .orders_by_supplier
            .get(&supplier_id)
            .into_iter()
            .flatten()
            .filter_map(|id| ledger.orders.get(id))
            .cloned()
            .collect()
    }

    /// All of `supplier_id`'s transactions, in creation order.
    pub fn transactions_by_supplier(&self, supplier_id: UserId) -> Vec<Transaction> {
        let ledger = self.ledger.read();
        ledger
            .transactions_by_supplier
            .get(&supplier_id)
            .into_iter()
            .flatten()
            .filter_map(|id| ledger.transactions.get(id))
            .cloned()
            .collect()
    }

    /// The supplier's reconciled position as of `now`.
    ///
    /// Computed fresh on every call from a consistent snapshot of both
    /// collections; nothing is cached.
    pub fn balance(&self, supplier_id: UserId, now: DateTime<Utc>) -> SupplierBalance {
        self.ledger.read().balance_for(supplier_id, now)
    }
}
