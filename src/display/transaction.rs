//! Transaction log display formatting

use crate::models::Transaction;

/// Format log records as a table, oldest first
pub fn format_transaction_list(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<20}  {:<8}  {:>14}  {:<8}\n",
        "Timestamp", "Type", "Amount", "Account"
    ));
    output.push_str(&format!(
        "{:-<20}  {:-<8}  {:->14}  {:-<8}\n",
        "", "", "", ""
    ));

    for txn in transactions {
        let account = txn
            .related_account
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "{:<20}  {:<8}  {:>14}  {:<8}\n",
            txn.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            txn.kind.as_str(),
            txn.amount.to_string(),
            account,
        ));
    }

    output
}
