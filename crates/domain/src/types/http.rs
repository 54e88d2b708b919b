//! HTTP-level vocabulary: verbs, request content types, response formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{CONTENT_TYPES_ALLOWED, OUTPUT_FORMATS_ALLOWED};
use crate::errors::DigirestError;

/// HTTP verbs supported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this verb carry a body
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = DigirestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(DigirestError::config(format!("invalid verb: {other}"))),
        }
    }
}

/// Request body encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    Json,
    #[default]
    FormUrlEncoded,
    MultipartForm,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => CONTENT_TYPES_ALLOWED[0],
            Self::FormUrlEncoded => CONTENT_TYPES_ALLOWED[1],
            Self::MultipartForm => CONTENT_TYPES_ALLOWED[2],
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = DigirestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Json, Self::FormUrlEncoded, Self::MultipartForm]
            .into_iter()
            .find(|candidate| candidate.as_str() == s)
            .ok_or_else(|| DigirestError::config(format!("content type not supported: {s}")))
    }
}

impl Serialize for ContentType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Response format sent in the `Accept` header.
///
/// Only the values of [`OUTPUT_FORMATS_ALLOWED`] can be constructed; parsing
/// is case-insensitive and stores the lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputFormat(&'static str);

impl OutputFormat {
    pub const JSON: Self = Self(OUTPUT_FORMATS_ALLOWED[0]);
    pub const XML: Self = Self(OUTPUT_FORMATS_ALLOWED[1]);
    pub const CSV: Self = Self(OUTPUT_FORMATS_ALLOWED[2]);
    pub const JS: Self = Self(OUTPUT_FORMATS_ALLOWED[3]);
    pub const BIN: Self = Self(OUTPUT_FORMATS_ALLOWED[4]);

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn is_json(&self) -> bool {
        *self == Self::JSON
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::JSON
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl FromStr for OutputFormat {
    type Err = DigirestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        OUTPUT_FORMATS_ALLOWED
            .iter()
            .find(|allowed| **allowed == lowered)
            .map(|allowed| Self(*allowed))
            .ok_or_else(|| {
                DigirestError::config(format!(
                    "Only {} are supported.",
                    OUTPUT_FORMATS_ALLOWED.join(", ")
                ))
            })
    }
}

impl Serialize for OutputFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
