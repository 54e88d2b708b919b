//! Client constants
//!
//! Allow-lists and wire-level names shared by every layer. The allow-lists
//! are immutable; validation goes through [`crate::OutputFormat`] and
//! [`crate::ContentType`].

/// Version reported by the debug dump
pub const WRAPPER_VERSION: &str = "2.1";

/// Response formats accepted for the `Accept` header
pub const OUTPUT_FORMATS_ALLOWED: [&str; 5] =
    ["application/json", "application/xml", "text/csv", "application/js", "application/bin"];

/// Request content types accepted for the `Content-Type` header
pub const CONTENT_TYPES_ALLOWED: [&str; 3] =
    ["application/json", "application/x-www-form-urlencoded", "multipart/form-data"];

/// Prefix rendered in front of file paths in multipart bodies
pub const FILE_MARKER: &str = "@";

// Header names
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_ACCEPT: &str = "Accept";

// OAuth token endpoint form fields
pub const FIELD_GRANT_TYPE: &str = "grant_type";
pub const FIELD_CLIENT_ID: &str = "client_id";
pub const FIELD_CLIENT_SECRET: &str = "client_secret";
pub const FIELD_REFRESH_TOKEN: &str = "refresh_token";
pub const FIELD_USERNAME: &str = "username";
pub const FIELD_PASSWORD: &str = "password";

/// Parameter carrying the action name in dynamic dispatch
pub const ACTION_PARAM: &str = "action";

/// Connect timeout applied by the HTTP transport
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

