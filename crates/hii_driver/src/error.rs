//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, graph compile/runtime failures, catalog resolution and freshness
//! failures raised during pre-flight validation, IO, and generic errors.
use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid weight configuration: {0}")]
    InvalidWeightConfiguration(String),

    #[error("no asset for '{key}': {detail}")]
    NotFound { key: String, detail: String },

    #[error("category '{key}' could not be resolved: {reason}")]
    CategoryUnresolvable { key: String, reason: String },

    #[error(
        "input '{key}' is stale: asset from {effective_date} is {age_days} days older than {as_of} (max {max_age_days})"
    )]
    StaleInput {
        key: String,
        as_of: NaiveDate,
        effective_date: NaiveDate,
        age_days: i64,
        max_age_days: u32,
    },

    #[error("fieldgraph compile error: {0}")]
    Compile(String),

    #[error("field runtime error: {0}")]
    Runtime(String),

    #[error("missing presence layer '{id}'")]
    MissingPresence { id: String },

    #[error("unknown field '{id}'")]
    UnknownField { id: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns `true` for errors raised by pre-flight input validation.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Error::CategoryUnresolvable { .. }
                | Error::StaleInput { .. }
                | Error::InvalidWeightConfiguration(_)
        )
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        matches!(err, Error::Other(_))
            .then_some(())
            .expect("expected Other variant");
    }

    #[test]
    fn from_str_allocates_owned_message() {
        let err: Error = "issue".into();
        assert!(matches!(err, Error::Other(ref msg) if msg == "issue"));
    }

    #[test]
    fn stale_input_message_names_the_dates() {
        let err = Error::StaleInput {
            key: "osm".into(),
            as_of: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            effective_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            age_days: 790,
            max_age_days: 365,
        };
        let msg = err.to_string();
        assert!(msg.contains("osm"));
        assert!(msg.contains("2019-01-01"));
        assert!(msg.contains("max 365"));
    }

    #[test]
    fn not_found_names_the_key() {
        let err = Error::NotFound {
            key: "groads".into(),
            detail: "no static asset".into(),
        };
        assert_eq!(err.to_string(), "no asset for 'groads': no static asset");
    }

    #[test]
    fn preflight_kinds_are_flagged() {
        assert!(Error::InvalidWeightConfiguration("x".into()).is_preflight());
        assert!(Error::CategoryUnresolvable {
            key: "k".into(),
            reason: "r".into()
        }
        .is_preflight());
        assert!(!Error::Runtime("x".into()).is_preflight());
    }
}
