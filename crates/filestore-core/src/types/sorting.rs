//! Sorting types for list endpoints.
//!
//! Sort parameters arrive as `field[,asc|desc]`. Each listable resource
//! declares its own whitelist of sortable fields through [`SortKey`].

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Return the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A whitelisted sortable field of some resource.
pub trait SortKey: Copy + Sized {
    /// Comma-separated list of accepted names, used in error messages.
    const ACCEPTED: &'static str;

    /// Parse a client-facing field name.
    fn from_field(field: &str) -> Option<Self>;
}

/// A parsed sort specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K> {
    /// Field to order by.
    pub key: K,
    /// Sort direction.
    pub direction: SortDirection,
}

impl<K: SortKey> Sort<K> {
    /// Create a new sort.
    pub fn new(key: K, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Parse `field[,asc|desc]`, falling back to `default` when absent or blank.
    pub fn parse_or(raw: Option<&str>, default: Self) -> AppResult<Self> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(default);
        };

        let (field, direction) = match raw.split_once(',') {
            Some((field, dir)) => (field.trim(), parse_direction(dir.trim())?),
            None => (raw, SortDirection::Asc),
        };

        let key = K::from_field(field).ok_or_else(|| {
            AppError::invalid_input(format!(
                "Invalid sort field: '{field}'. Expected one of: {}",
                K::ACCEPTED
            ))
        })?;

        Ok(Self { key, direction })
    }
}

fn parse_direction(raw: &str) -> AppResult<SortDirection> {
    match raw.to_ascii_lowercase().as_str() {
        "" | "asc" => Ok(SortDirection::Asc),
        "desc" => Ok(SortDirection::Desc),
        other => Err(AppError::invalid_input(format!(
            "Invalid sort direction: '{other}'. Expected one of: asc, desc"
        ))),
    }
}
