use crate::utils::error::{IbmiError, Result};
use regex::Regex;
use std::sync::OnceLock;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// DB2 for i 系統名稱：可含 #、@、$，可帶 schema 前綴 (LIB.TABLE)
fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_#@$][A-Za-z0-9_#@$]*(\.[A-Za-z_#@$][A-Za-z0-9_#@$]*)?$")
            .expect("identifier pattern is valid")
    })
}

pub fn validate_identifier(field_name: &str, identifier: &str) -> Result<()> {
    if identifier_regex().is_match(identifier) {
        return Ok(());
    }
    Err(IbmiError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: identifier.to_string(),
        reason: "Not a valid DB2 identifier".to_string(),
    })
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*[^}]+\s*\}\}").expect("placeholder pattern is valid"))
}

/// 表格名稱允許 `{{field}}` 樣板，驗證時只檢查樣板以外的部分
pub fn validate_table_template(field_name: &str, table: &str) -> Result<()> {
    validate_non_empty_string(field_name, table)?;
    let filled = placeholder_regex().replace_all(table, "X");
    validate_identifier(field_name, &filled)
}

pub fn validate_host(field_name: &str, host: &str) -> Result<()> {
    validate_non_empty_string(field_name, host)?;

    if host.contains(char::is_whitespace) || host.contains('/') {
        return Err(IbmiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: host.to_string(),
            reason: "Host must be a bare host name or IP address".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(IbmiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| IbmiError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(IbmiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(IbmiError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: format!("Supported values: {}", allowed.join(", ")),
    })
}
