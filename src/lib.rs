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

//! # Cambio
//!
//! This library provides the order lifecycle and escrow ledger engine for a
//! currency-conversion marketplace: clients place orders priced in a
//! foreign currency, suppliers ship them, and an administrative workflow
//! finalizes orders and approves supplier withdrawals.
//!
//! ## Core Components
//!
//! - [`Engine`]: order store and transaction ledger behind one consistent
//!   lock
//! - [`quote()`]: pure currency conversion with the client's service fee
//! - [`SupplierBalance`]: per-supplier position derived fresh on every read
//! - [`Directory`]: the user-store collaborator (codes, approval flags,
//!   fee overrides), with [`InMemoryDirectory`] as the default backing
//!
//! ## Example
//!
//! ```
//! use cambio_rs::{CreateOrder, Engine, Shipment, UserId};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! engine.directory().register_client(UserId(1), Some(dec!(5))).unwrap();
//! let code = engine.directory().register_supplier(UserId(2)).unwrap();
//!
//! // What the client will pay today, at today's rate and fee.
//! let quote = engine.quote_for_client(UserId(1), dec!(1000), dec!(0.75)).unwrap();
//! assert_eq!(quote.total_payable, dec!(787.50));
//!
//! // The order stores only the foreign value.
//! let order = engine
//!     .create_order(CreateOrder {
//!         client_id: UserId(1),
//!         supplier_code: code,
//!         description: "Electronics batch A".into(),
//!         value_foreign: dec!(1000),
//!     })
//!     .unwrap();
//!
//! engine
//!     .mark_shipped(
//!         order.id,
//!         Shipment {
//!             tracking_code: "CN123456789BR".into(),
//!             photos: vec!["box.jpg".into()],
//!         },
//!     )
//!     .unwrap();
//! engine.finalize(order.id).unwrap();
//!
//! let balance = engine.balance(order.supplier_id, chrono::Utc::now());
//! assert_eq!(balance.total_earned, dec!(1000));
//! assert_eq!(balance.available, dec!(1000));
//! ```
//!
//! ## Thread Safety
//!
//! All engine operations take `&self` and are safe to call from multiple
//! threads. Mutations serialize on a write lock; balance reads observe a
//! point-in-time snapshot across orders and transactions.

mod balance;
mod base;
mod directory;
mod engine;
pub mod error;
mod order;
mod quote;
mod transaction;

pub use balance::SupplierBalance;
pub use base::{OrderId, SupplierCode, TransactionId, UserId};
pub use directory::{Directory, InMemoryDirectory, User, UserRole};
pub use engine::{CreateOrder, Engine};
pub use error::EngineError;
pub use order::{Order, OrderStatus, Shipment};
pub use quote::{DEFAULT_FEE_PERCENT, Quote, quote};
pub use transaction::{Transaction, TransactionKind, TransactionStatus};
