//! User-supplied locations
//!
//! A [`LocationQuery`] is the normalized form of what the user typed. It is
//! what gets sent to the weather API and what cache keys are built from.

pub mod geo;

pub use geo::{GeoClient, GeoError, Place};

use std::fmt;
use thiserror::Error;

/// Most components a query may have: city, state, country
const MAX_COMPONENTS: usize = 3;

/// Reasons a location string is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location is empty")]
    Empty,

    #[error("Location '{0}' has an empty component")]
    EmptyComponent(String),

    #[error("Location has {0} components; use 'city', 'city, country' or 'city, state, country'")]
    TooManyComponents(usize),
}

/// A validated location query such as "Vancouver, BC, CA"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationQuery {
    text: String,
}

impl LocationQuery {
    /// Validates and normalizes user input
    ///
    /// Components are trimmed, inner whitespace is collapsed, and they are
    /// re-joined with ", ".
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(LocationError::Empty);
        }

        let components: Vec<String> = input
            .split(',')
            .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();

        if components.len() > MAX_COMPONENTS {
            return Err(LocationError::TooManyComponents(components.len()));
        }
        if components.iter().any(String::is_empty) {
            return Err(LocationError::EmptyComponent(input.to_string()));
        }

        Ok(Self {
            text: components.join(", "),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Case-insensitive identity used in cache keys
    pub fn cache_key(&self) -> String {
        self.text.to_lowercase()
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
