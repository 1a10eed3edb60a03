use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),

    #[error("Component '{component}' cannot be empty in '{assignment}'.")]
    EmptyComponent {
        component: &'static str,
        assignment: String,
    },

    #[error("Invalid {expected} value for '{key}': '{value}'")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Splits a `--set` argument into its dotted key and raw value.
pub fn parse_assignment(assignment: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidAssignment(assignment.to_string()))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "key",
            assignment: assignment.to_string(),
        });
    }
    if value.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "value",
            assignment: assignment.to_string(),
        });
    }
    Ok((key, value))
}

pub fn parse_value<T: FromStr>(key: &str, value: &str, expected: &'static str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}
