//! Request assembly and dispatch
//!
//! Pure helpers (`headers`, `body`, `uri`, `naming`) feed the
//! [`RequestDispatcher`], which owns the network-facing retry policy.

pub mod body;
pub mod dispatcher;
pub mod headers;
pub mod naming;
pub mod uri;

pub use body::{encode_body, encode_form_pairs};
pub use dispatcher::{ClientSettings, DispatchContext, RequestDispatcher};
pub use headers::merge_headers;
pub use naming::{parse_method_name, ActionTarget};
pub use uri::{build_uri, normalize_base_url};
