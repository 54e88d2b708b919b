//! Domain types

pub mod credential;
pub mod details;
pub mod http;
pub mod request;
pub mod response;

pub use credential::{Credential, GrantType};
pub use details::CallDetails;
pub use http::{ContentType, OutputFormat, Verb};
pub use request::{json_object_fields, FormValue, Pairs, RequestBody, RequestSpec};
pub use response::{ApiResponse, ResponseBody};
