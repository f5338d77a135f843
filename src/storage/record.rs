//! Line-oriented record format
//!
//! Every collection is stored as newline-terminated lines of `|`-separated
//! fields. There is no escaping, so field values must not contain the
//! delimiter or a line break; [`validate_field`] enforces that on write.

use crate::error::{CofferError, CofferResult};

/// Field delimiter within a record line
pub const FIELD_DELIMITER: char = '|';

/// A value stored as one line of a plaintext record set
pub trait Record: Sized {
    /// Human-readable name used in log and error messages
    const KIND: &'static str;

    fn to_line(&self) -> String;

    fn from_line(line: &str) -> Result<Self, String>;
}

/// Join fields with the delimiter
pub fn join_fields<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(FIELD_DELIMITER);
        }
        line.push_str(field.as_ref());
    }
    line
}

/// Split a line into between `min` and `max` fields
pub fn split_fields(line: &str, min: usize, max: usize) -> Result<Vec<&str>, String> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() < min || fields.len() > max {
        return Err(if min == max {
            format!("expected {} fields, found {}", min, fields.len())
        } else {
            format!(
                "expected {} to {} fields, found {}",
                min,
                max,
                fields.len()
            )
        });
    }
    Ok(fields)
}

/// Reject a value that would break the line format
pub fn validate_field(name: &str, value: &str) -> CofferResult<()> {
    if value.contains(FIELD_DELIMITER) {
        return Err(CofferError::Validation(format!(
            "{} must not contain '{}'",
            name, FIELD_DELIMITER
        )));
    }
    if value.contains('\n') || value.contains('\r') {
        return Err(CofferError::Validation(format!(
            "{} must not contain line breaks",
            name
        )));
    }
    Ok(())
}

/// Parse every non-empty line of a decrypted record set
pub fn parse_lines<R: Record>(text: &str) -> CofferResult<Vec<R>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            R::from_line(line).map_err(|reason| CofferError::Record {
                line: index + 1,
                reason: format!("{}: {}", R::KIND, reason),
            })
        })
        .collect()
}

/// Serialize records, one line each
pub fn render_lines<R: Record>(records: &[R]) -> String {
    let mut text = String::new();
    for record in records {
        text.push_str(&record.to_line());
        text.push('\n');
    }
    text
}
