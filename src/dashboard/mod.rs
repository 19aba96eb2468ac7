//! Dashboard module
//!
//! One page per currency with the ledger totals, the current USDT rate, the
//! form for new transactions and the ledger itself.

mod cards;
mod draft;
mod ledger_table;
mod page;
mod rate_panel;

pub use cards::{SUMMARY_CARDS_ID, summary_cards};
pub use draft::{DraftForm, update_draft_endpoint};
pub use ledger_table::ledger_table;
pub use page::get_dashboard_page;
pub use rate_panel::{refresh_rate_endpoint, set_manual_rate_endpoint};
