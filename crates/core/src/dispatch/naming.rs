//! `<collection><Action>` method-name convention

use std::fmt;

use digirest_domain::{DigirestError, Result};

/// Collection and action decoded from a method name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTarget {
    pub collection: String,
    pub action: String,
}

impl ActionTarget {
    pub fn new(collection: impl Into<String>, action: impl Into<String>) -> Self {
        Self { collection: collection.into(), action: action.into() }
    }
}

impl fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.action)
    }
}

/// Decode `mailingsRead` into (`mailings`, `read`).
///
/// The name must be a non-empty run of lowercase ASCII letters or digits,
/// one uppercase letter, then only lowercase letters.
///
/// # Errors
/// Returns `Config` for any other shape
pub fn parse_method_name(name: &str) -> Result<ActionTarget> {
    let invalid = || DigirestError::config(format!("Invalid method name: {name}"));

    let split = name.find(|c: char| c.is_ascii_uppercase()).ok_or_else(invalid)?;
    let (collection, action) = name.split_at(split);

    if collection.is_empty()
        || !collection.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let mut rest = action.chars();
    rest.next();
    if !rest.all(|c| c.is_ascii_lowercase()) {
        return Err(invalid());
    }

    Ok(ActionTarget::new(collection, action.to_ascii_lowercase()))
}
