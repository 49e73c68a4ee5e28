//! Input checks for settings updates and other client payloads.
//!
//! Garde reports field paths using Rust names; the browser only knows the
//! camelCase JSON names, so errors are rewritten into those before they
//! reach a 400 response.

use crate::domain::DomainError;
use garde::{Report, Validate};

/// Validate a client payload, turning every violation into one
/// `DomainError::ValidationError` such as
/// `co2Threshold: lower than 0, breakInterval: lower than 1`.
pub fn validate_struct<T>(value: &T) -> Result<(), DomainError>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| DomainError::ValidationError(describe_violations(&report)))
}

fn describe_violations(report: &Report) -> String {
    let mut violations = Vec::new();
    for (path, error) in report.iter() {
        let field = json_field_name(&path.to_string());
        violations.push(match field.as_str() {
            "" => error.message().to_string(),
            field => format!("{}: {}", field, error.message()),
        });
    }
    violations.join(", ")
}

/// `break_interval` -> `breakInterval`
fn json_field_name(path: &str) -> String {
    let mut name = String::with_capacity(path.len());
    let mut next_upper = false;
    for c in path.chars() {
        if c == '_' {
            next_upper = true;
        } else if next_upper {
            name.extend(c.to_uppercase());
            next_upper = false;
        } else {
            name.push(c);
        }
    }
    name
}
