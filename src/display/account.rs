//! Account display formatting
//!
//! Formats accounts for terminal output in table and detail views.

use crate::models::{BankAccount, Money, Transaction};

use super::transaction::format_transaction_list;

/// Format a list of accounts as a table with a total row
pub fn format_account_list(accounts: &[BankAccount]) -> String {
    if accounts.is_empty() {
        return "No accounts found.\n".to_string();
    }

    let holder_width = accounts
        .iter()
        .map(|a| a.holder.chars().count())
        .max()
        .unwrap_or(6)
        .max(6);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<8}  {:<holder_width$}  {:>14}\n",
        "Number",
        "Holder",
        "Balance",
        holder_width = holder_width,
    ));
    output.push_str(&separator(holder_width));

    for account in accounts {
        output.push_str(&format!(
            "{:<8}  {:<holder_width$}  {:>14}\n",
            account.number.to_string(),
            account.holder,
            account.balance.to_string(),
            holder_width = holder_width,
        ));
    }

    let total: Money = accounts.iter().map(|a| a.balance).sum();
    output.push_str(&separator(holder_width));
    output.push_str(&format!(
        "{:<8}  {:<holder_width$}  {:>14}\n",
        "TOTAL",
        "",
        total.to_string(),
        holder_width = holder_width,
    ));

    output
}

fn separator(holder_width: usize) -> String {
    format!(
        "{:-<8}  {:-<holder_width$}  {:->14}\n",
        "",
        "",
        "",
        holder_width = holder_width,
    )
}

/// Format one account with its history
pub fn format_account_details(account: &BankAccount, history: &[Transaction]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Account: {}\n", account.number));
    output.push_str(&format!("  Holder:         {}\n", account.holder));
    output.push_str(&format!("  Balance:        {}\n", account.balance));
    output.push_str(&format!("  Transactions:   {}\n", history.len()));

    if !history.is_empty() {
        output.push('\n');
        output.push_str(&format_transaction_list(history));
    }

    output
}
