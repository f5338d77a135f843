//! Display formatting for terminal output
//!
//! Renders models as aligned text tables.

pub mod account;
pub mod transaction;
pub mod vault;

pub use account::{format_account_details, format_account_list};
pub use transaction::format_transaction_list;
pub use vault::format_vault_list;
