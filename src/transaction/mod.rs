//! Transactions in a user's ledger.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - The endpoints for adding, editing and deleting ledger rows

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;

pub use core::{
    Transaction, TransactionType, TransactionUpdate, count_transactions, create_transaction,
    create_transaction_table, delete_transaction, delete_transactions, get_transaction,
    get_transactions, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
