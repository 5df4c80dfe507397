//! Bank accounts, their ledgers and the pages for managing them.

mod account_page;
mod core;
mod funds_endpoint;
pub(crate) mod ledger;
mod status;
mod status_endpoint;

pub use account_page::{get_account_page, status_badge};
pub use core::{
    Account, AccountId, AccountKind, AccountStatus, NewAccount, create_account_table,
    get_account, get_accounts_for_customer, insert_account,
};
pub use funds_endpoint::account_funds_endpoint;
pub use ledger::{
    Adjustment, Direction, LedgerEntry, adjust_balance, create_ledger_table, get_ledger_entries,
};
pub use status::set_account_status;
pub use status_endpoint::account_status_endpoint;
