//! Vault display formatting

use crate::models::VaultEntry;

const HIDDEN: &str = "********";

/// Format vault entries; passwords are masked unless `reveal` is set
pub fn format_vault_list(entries: &[VaultEntry], reveal: bool) -> String {
    if entries.is_empty() {
        return "Vault is empty.\n".to_string();
    }

    let service_width = entries
        .iter()
        .map(|e| e.service.chars().count())
        .max()
        .unwrap_or(7)
        .max(7);
    let user_width = entries
        .iter()
        .map(|e| e.username.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<service_width$}  {:<user_width$}  {}\n",
        "Service",
        "Username",
        "Password",
        service_width = service_width,
        user_width = user_width,
    ));
    output.push_str(&format!(
        "{:-<service_width$}  {:-<user_width$}  {:-<8}\n",
        "",
        "",
        "",
        service_width = service_width,
        user_width = user_width,
    ));

    for entry in entries {
        let password = if reveal {
            entry.password.as_str()
        } else {
            HIDDEN
        };
        output.push_str(&format!(
            "{:<service_width$}  {:<user_width$}  {}\n",
            entry.service,
            entry.username,
            password,
            service_width = service_width,
            user_width = user_width,
        ));
    }

    output
}
