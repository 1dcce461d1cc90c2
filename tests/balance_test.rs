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

//! Balance reconciliation integration tests.

use cambio_rs::{CreateOrder, Engine, Order, Shipment, SupplierCode, UserId};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const CLIENT: UserId = UserId(1);
const SUPPLIER: UserId = UserId(2);

fn setup() -> (Engine, SupplierCode) {
    let engine = Engine::new();
    engine.directory().register_client(CLIENT, None).unwrap();
    let code = SupplierCode::new("888888").unwrap();
    engine
        .directory()
        .register_supplier_with_code(SUPPLIER, code.clone())
        .unwrap();
    (engine, code)
}

fn make_order(engine: &Engine, code: &SupplierCode, value: Decimal) -> Order {
    engine
        .create_order(CreateOrder {
            client_id: CLIENT,
            supplier_code: code.clone(),
            description: "Batch".to_string(),
            value_foreign: value,
        })
        .unwrap()
}

fn ship(engine: &Engine, order: &Order) {
    engine
        .mark_shipped(
            order.id,
            Shipment {
                tracking_code: "CN123".to_string(),
                photos: vec!["box.jpg".to_string()],
            },
        )
        .unwrap();
}

#[test]
fn pending_counts_open_orders_only() {
    let (engine, code) = setup();
    make_order(&engine, &code, dec!(100));
    make_order(&engine, &code, dec!(200));
    let sent = make_order(&engine, &code, dec!(400));
    ship(&engine, &sent);

    let balance = engine.balance(SUPPLIER, Utc::now());
    assert_eq!(balance.pending, 2);
}

/// Pending, sent, and disputed orders all count as held; only
/// finalization releases value.
#[test]
fn escrow_covers_every_unfinalized_status() {
    let (engine, code) = setup();

    make_order(&engine, &code, dec!(100));

    let sent = make_order(&engine, &code, dec!(200));
    ship(&engine, &sent);

    let disputed = make_order(&engine, &code, dec!(400));
    ship(&engine, &disputed);
    engine.raise_dispute(disputed.id, "late").unwrap();

    let finalized = make_order(&engine, &code, dec!(800));
    ship(&engine, &finalized);
    engine.finalize(finalized.id).unwrap();

    let balance = engine.balance(SUPPLIER, Utc::now());
    assert_eq!(balance.held_in_escrow, dec!(700));
    assert_eq!(balance.total_earned, dec!(800));
    assert_eq!(balance.available, dec!(800));
}

#[test]
fn available_is_earned_minus_committed() {
    let (engine, code) = setup();
    let order = make_order(&engine, &code, dec!(1000));
    ship(&engine, &order);
    engine.finalize(order.id).unwrap();

    let pending = engine.request_withdrawal(SUPPLIER, dec!(100)).unwrap();
    let approved = engine.request_withdrawal(SUPPLIER, dec!(200)).unwrap();
    engine.approve_withdrawal(approved.id).unwrap();
    let rejected = engine.request_withdrawal(SUPPLIER, dec!(400)).unwrap();
    engine.reject_withdrawal(rejected.id).unwrap();

    let balance = engine.balance(SUPPLIER, Utc::now());
    assert_eq!(balance.total_committed, dec!(300));
    assert_eq!(balance.available, dec!(700));
    assert_eq!(
        balance.available,
        balance.total_earned - balance.total_committed
    );

    // The pending request is still earmarked.
    assert_eq!(pending.amount_foreign, dec!(100));
}

#[test]
fn balances_are_isolated_per_supplier() {
    let (engine, code) = setup();
    let other_code = SupplierCode::new("777777").unwrap();
    engine
        .directory()
        .register_supplier_with_code(UserId(3), other_code.clone())
        .unwrap();

    let order = make_order(&engine, &code, dec!(1000));
    ship(&engine, &order);
    engine.finalize(order.id).unwrap();

    let other = engine.balance(UserId(3), Utc::now());
    assert_eq!(other.total_earned, Decimal::ZERO);
    assert_eq!(other.held_in_escrow, Decimal::ZERO);

    let mine = engine.balance(SUPPLIER, Utc::now());
    assert_eq!(mine.total_earned, dec!(1000));
}

/// The daily figure is keyed on order creation, not finalization: a
/// pending order created today already shows up.
#[test]
fn received_today_measures_orders_placed() {
    let (engine, code) = setup();
    let order = make_order(&engine, &code, dec!(150));

    let balance = engine.balance(SUPPLIER, order.created_at);
    assert_eq!(balance.received_today, dec!(150));
    assert_eq!(balance.received_week, dec!(150));
    assert_eq!(balance.total_earned, Decimal::ZERO);
}

/// `received_today` is UTC-calendar-aligned while `received_week` rolls:
/// 25 hours after creation the order has always crossed a UTC midnight
/// but is still inside the rolling week.
#[test]
fn daily_window_is_calendar_aligned() {
    let (engine, code) = setup();
    let order = make_order(&engine, &code, dec!(150));

    let later = order.created_at + Duration::hours(25);
    let balance = engine.balance(SUPPLIER, later);
    assert_eq!(balance.received_today, Decimal::ZERO);
    assert_eq!(balance.received_week, dec!(150));
}

#[test]
fn weekly_window_closes_after_seven_days() {
    let (engine, code) = setup();
    let order = make_order(&engine, &code, dec!(150));

    let just_inside = order.created_at + Duration::days(7) - Duration::seconds(1);
    assert_eq!(
        engine.balance(SUPPLIER, just_inside).received_week,
        dec!(150)
    );

    let at_boundary = order.created_at + Duration::days(7);
    assert_eq!(
        engine.balance(SUPPLIER, at_boundary).received_week,
        Decimal::ZERO
    );
}

#[test]
fn unknown_supplier_has_zero_balance() {
    let (engine, _) = setup();
    let balance = engine.balance(UserId(99), Utc::now());
    assert_eq!(balance.pending, 0);
    assert_eq!(balance.held_in_escrow, Decimal::ZERO);
    assert_eq!(balance.total_earned, Decimal::ZERO);
    assert_eq!(balance.total_committed, Decimal::ZERO);
    assert_eq!(balance.available, Decimal::ZERO);
}

/// Balances are recomputed on every read; a mutation between two reads is
/// always visible in the second.
#[test]
fn balance_is_never_cached() {
    let (engine, code) = setup();
    let order = make_order(&engine, &code, dec!(500));
    ship(&engine, &order);

    assert_eq!(engine.balance(SUPPLIER, Utc::now()).available, dec!(0));
    engine.finalize(order.id).unwrap();
    assert_eq!(engine.balance(SUPPLIER, Utc::now()).available, dec!(500));

    engine.request_withdrawal(SUPPLIER, dec!(500)).unwrap();
    assert_eq!(engine.balance(SUPPLIER, Utc::now()).available, dec!(0));
}
