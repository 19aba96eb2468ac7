//! Consolidated periods: snapshots of a ledger kept after the ledger is cleared.
//!
//! This module contains:
//! - The `Period` model and the `PeriodList` trait for storing periods
//! - SQLite and JSON file implementations of `PeriodList`
//! - The endpoints for consolidating a ledger, listing periods and deleting them

mod balances_page;
mod consolidate;
mod core;
mod delete_endpoint;
mod json_file;
mod sqlite;
mod store;

pub use balances_page::get_balances_page;
pub use consolidate::{ConsolidationLocks, consolidate_endpoint};
pub use core::{Period, PeriodBuilder, PeriodKey};
pub use delete_endpoint::delete_period_endpoint;
pub use json_file::JsonFilePeriodList;
pub use sqlite::{SqlitePeriodList, create_period_table};
pub use store::{PeriodList, PeriodStoreError};

#[cfg(test)]
pub(crate) use core::test_utils;
