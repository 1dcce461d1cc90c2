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

use cambio_rs::{CreateOrder, Engine, OrderId, Shipment, SupplierCode, TransactionId, UserId};
use chrono::Utc;
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Escrow Ledger - Process marketplace operation CSV files
///
/// Reads operations from a CSV file and outputs supplier balances to stdout.
/// Supports supplier/client registration, orders, shipments, disputes,
/// finalization, and the withdrawal approval workflow.
#[derive(Parser, Debug)]
#[command(name = "cambio-rs")]
#[command(about = "An escrow ledger that processes marketplace operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,user,ref,amount,arg1,arg2
    /// Example: cargo run -- operations.csv > balances.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Open input file
    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    // Process operations from CSV
    let (engine, suppliers) = match process_operations(BufReader::new(file)) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    // Write results to stdout
    if let Err(e) = write_balances(&engine, &suppliers, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, user, ref, amount, arg1, arg2`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    user: Option<u64>,
    #[serde(rename = "ref", deserialize_with = "csv::invalid_option")]
    reference: Option<u64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    arg1: Option<String>,
    arg2: Option<String>,
}

/// One marketplace operation decoded from a CSV row.
#[derive(Debug)]
enum Operation {
    RegisterSupplier {
        id: UserId,
        code: Option<SupplierCode>,
    },
    ApproveSupplier {
        id: UserId,
    },
    RegisterClient {
        id: UserId,
        fee: Option<Decimal>,
    },
    CreateOrder {
        client: UserId,
        code: SupplierCode,
        value: Decimal,
        description: String,
    },
    Ship {
        order: OrderId,
        tracking: String,
        photos: Vec<String>,
    },
    Dispute {
        order: OrderId,
        reason: String,
    },
    Finalize {
        order: OrderId,
    },
    Withdraw {
        supplier: UserId,
        amount: Decimal,
    },
    ApproveWithdrawal {
        transaction: TransactionId,
    },
    RejectWithdrawal {
        transaction: TransactionId,
    },
}

impl CsvRecord {
    /// Converts a CSV record into an operation.
    ///
    /// Returns `None` for unknown operations or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        match self.op.to_lowercase().as_str() {
            "supplier" => Some(Operation::RegisterSupplier {
                id: UserId(self.user?),
                code: match self.arg1.filter(|code| !code.is_empty()) {
                    Some(code) => Some(SupplierCode::new(code).ok()?),
                    None => None,
                },
            }),
            "approve_supplier" => Some(Operation::ApproveSupplier {
                id: UserId(self.user?),
            }),
            "client" => Some(Operation::RegisterClient {
                id: UserId(self.user?),
                fee: self.amount,
            }),
            "order" => Some(Operation::CreateOrder {
                client: UserId(self.user?),
                code: SupplierCode::new(self.arg1?).ok()?,
                value: self.amount?,
                description: self.arg2?,
            }),
            "ship" => Some(Operation::Ship {
                order: OrderId(self.reference?),
                tracking: self.arg1?,
                photos: self
                    .arg2?
                    .split(';')
                    .filter(|photo| !photo.is_empty())
                    .map(str::to_string)
                    .collect(),
            }),
            "dispute" => Some(Operation::Dispute {
                order: OrderId(self.reference?),
                reason: self.arg1?,
            }),
            "finalize" => Some(Operation::Finalize {
                order: OrderId(self.reference?),
            }),
            "withdraw" => Some(Operation::Withdraw {
                supplier: UserId(self.user?),
                amount: self.amount?,
            }),
            "approve_withdrawal" => Some(Operation::ApproveWithdrawal {
                transaction: TransactionId(self.reference?),
            }),
            "reject_withdrawal" => Some(Operation::RejectWithdrawal {
                transaction: TransactionId(self.reference?),
            }),
            _ => None,
        }
    }
}

/// Applies one operation to the engine, recording supplier registrations
/// so the output knows which balances to report.
fn apply(
    engine: &Engine,
    suppliers: &mut Vec<UserId>,
    operation: Operation,
) -> Result<(), cambio_rs::EngineError> {
    match operation {
        Operation::RegisterSupplier { id, code } => {
            match code {
                Some(code) => engine.directory().register_supplier_with_code(id, code)?,
                None => {
                    engine.directory().register_supplier(id)?;
                }
            }
            suppliers.push(id);
        }
        Operation::ApproveSupplier { id } => engine.directory().approve_supplier(id)?,
        Operation::RegisterClient { id, fee } => engine.directory().register_client(id, fee)?,
        Operation::CreateOrder {
            client,
            code,
            value,
            description,
        } => {
            engine.create_order(CreateOrder {
                client_id: client,
                supplier_code: code,
                description,
                value_foreign: value,
            })?;
        }
        Operation::Ship {
            order,
            tracking,
            photos,
        } => {
            engine.mark_shipped(
                order,
                Shipment {
                    tracking_code: tracking,
                    photos,
                },
            )?;
        }
        Operation::Dispute { order, reason } => {
            engine.raise_dispute(order, reason)?;
        }
        Operation::Finalize { order } => {
            engine.finalize(order)?;
        }
        Operation::Withdraw { supplier, amount } => {
            engine.request_withdrawal(supplier, amount)?;
        }
        Operation::ApproveWithdrawal { transaction } => {
            engine.approve_withdrawal(transaction)?;
        }
        Operation::RejectWithdrawal { transaction } => {
            engine.reject_withdrawal(transaction)?;
        }
    }
    Ok(())
}

/// Process operations from a CSV reader.
///
/// Streaming parse; malformed rows and failed operations are skipped so a
/// bad row never aborts the batch. Order and transaction ids are assigned
/// sequentially from zero, so later rows can reference earlier results.
///
/// # CSV Format
///
/// Expected columns: `op, user, ref, amount, arg1, arg2`
///
/// | op                  | user     | ref   | amount | arg1          | arg2        |
/// |---------------------|----------|-------|--------|---------------|-------------|
/// | supplier            | id       |       |        | code (opt)    |             |
/// | approve_supplier    | id       |       |        |               |             |
/// | client              | id       |       | fee?   |               |             |
/// | order               | client   |       | value  | supplier code | description |
/// | ship                |          | order |        | tracking      | photos (;)  |
/// | dispute             |          | order |        | reason        |             |
/// | finalize            |          | order |        |               |             |
/// | withdraw            | supplier |       | amount |               |             |
/// | approve_withdrawal  |          | tx    |        |               |             |
/// | reject_withdrawal   |          | tx    |        |               |             |
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
/// Individual operation errors are logged in debug mode but don't stop
/// processing.
pub fn process_operations<R: Read>(reader: R) -> Result<(Engine, Vec<UserId>), csv::Error> {
    let engine = Engine::new();
    let mut suppliers = Vec::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " order "
        .flexible(true) // Allow missing trailing fields
        .has_headers(true) // Skip first row as header
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(operation) = record.into_operation() else {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping invalid operation record");
                    continue;
                };

                // Apply operation, ignoring errors (silent failure)
                if let Err(_e) = apply(&engine, &mut suppliers, operation) {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping operation: {}", _e);
                }
            }
            Err(_e) => {
                // Skip malformed rows
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", _e);
                continue;
            }
        }
    }

    Ok((engine, suppliers))
}

/// Balance row in the output CSV.
#[derive(Debug, Serialize)]
struct BalanceRow {
    supplier: UserId,
    pending: usize,
    held_in_escrow: Decimal,
    total_earned: Decimal,
    total_committed: Decimal,
    available: Decimal,
    received_today: Decimal,
    received_week: Decimal,
}

/// Write supplier balances to a CSV writer.
///
/// Outputs one row per registered supplier, in registration order.
///
/// # CSV Format
///
/// Columns: `supplier, pending, held_in_escrow, total_earned,
/// total_committed, available, received_today, received_week`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_balances<W: Write>(
    engine: &Engine,
    suppliers: &[UserId],
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    let now = Utc::now();

    for &supplier in suppliers {
        let balance = engine.balance(supplier, now);
        wtr.serialize(BalanceRow {
            supplier,
            pending: balance.pending,
            held_in_escrow: balance.held_in_escrow,
            total_earned: balance.total_earned,
            total_committed: balance.total_committed,
            available: balance.available,
            received_today: balance.received_today,
            received_week: balance.received_week,
        })?;
    }

    // Flush to ensure all data is written
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    #[test]
    fn parse_full_lifecycle() {
        let csv = "op,user,ref,amount,arg1,arg2\n\
                   supplier,2,,,888888,\n\
                   approve_supplier,2,,,,\n\
                   client,1,,5,,\n\
                   order,1,,1000,888888,Electronics Batch A\n\
                   ship,,0,,CN123456789BR,box.jpg;label.jpg\n\
                   finalize,,0,,,\n";
        let reader = Cursor::new(csv);

        let (engine, suppliers) = process_operations(reader).unwrap();

        assert_eq!(suppliers, vec![UserId(2)]);
        let balance = engine.balance(UserId(2), Utc::now());
        assert_eq!(balance.total_earned, dec!(1000));
        assert_eq!(balance.available, dec!(1000));
    }

    #[test]
    fn parse_withdrawal_flow() {
        let csv = "op,user,ref,amount,arg1,arg2\n\
                   supplier,2,,,888888,\n\
                   client,1,,,,\n\
                   order,1,,1000,888888,Clothes Bundle\n\
                   ship,,0,,CN123,box.jpg\n\
                   finalize,,0,,,\n\
                   withdraw,2,,400,,\n\
                   approve_withdrawal,,0,,,\n";
        let reader = Cursor::new(csv);

        let (engine, _) = process_operations(reader).unwrap();

        let balance = engine.balance(UserId(2), Utc::now());
        assert_eq!(balance.total_committed, dec!(400));
        assert_eq!(balance.available, dec!(600));
    }

    #[test]
    fn overdraw_row_is_skipped() {
        let csv = "op,user,ref,amount,arg1,arg2\n\
                   supplier,2,,,888888,\n\
                   client,1,,,,\n\
                   order,1,,1000,888888,Batch\n\
                   withdraw,2,,400,,\n";
        let reader = Cursor::new(csv);

        let (engine, _) = process_operations(reader).unwrap();

        // Nothing finalized, so the withdrawal must not have landed.
        let balance = engine.balance(UserId(2), Utc::now());
        assert_eq!(balance.total_committed, dec!(0));
        assert!(engine.transactions_by_supplier(UserId(2)).is_empty());
    }

    #[test]
    fn parse_with_whitespace() {
        let csv = "op,user,ref,amount,arg1,arg2\n supplier , 2 , , , 888888 ,\n";
        let reader = Cursor::new(csv);

        let (_, suppliers) = process_operations(reader).unwrap();
        assert_eq!(suppliers, vec![UserId(2)]);
    }

    #[test]
    fn skip_malformed_rows() {
        let csv = "op,user,ref,amount,arg1,arg2\n\
                   supplier,2,,,888888,\n\
                   bogus,row,data,here,,\n\
                   supplier,3,,,777777,\n";
        let reader = Cursor::new(csv);

        let (_, suppliers) = process_operations(reader).unwrap();
        assert_eq!(suppliers, vec![UserId(2), UserId(3)]);
    }

    #[test]
    fn write_balances_to_csv() {
        let csv = "op,user,ref,amount,arg1,arg2\n\
                   supplier,2,,,888888,\n\
                   client,1,,,,\n\
                   order,1,,250,888888,Batch\n";
        let reader = Cursor::new(csv);
        let (engine, suppliers) = process_operations(reader).unwrap();

        let mut output = Vec::new();
        write_balances(&engine, &suppliers, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains(
            "supplier,pending,held_in_escrow,total_earned,total_committed,available,\
             received_today,received_week"
        ));
        assert!(output_str.contains("2,1,250"));
    }

    #[test]
    fn generated_code_when_none_given() {
        let csv = "op,user,ref,amount,arg1,arg2\n\
                   supplier,2,,,,\n";
        let reader = Cursor::new(csv);

        let (engine, suppliers) = process_operations(reader).unwrap();
        assert_eq!(suppliers, vec![UserId(2)]);

        let user = engine.directory().get(UserId(2)).unwrap();
        assert!(user.short_code.is_some());
    }
}
