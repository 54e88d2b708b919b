//! Snapshot of the last call, for debugging

use std::fmt;

use serde::Serialize;
use url::Url;

use super::http::Verb;
use crate::constants::WRAPPER_VERSION;

/// Debug view over the last request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallDetails {
    pub response_code: Option<u16>,
    pub url: String,
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub verb: Option<Verb>,
    /// Query parameters of the URL, in order, percent-decoded
    pub params_query: Vec<(String, String)>,
}

impl CallDetails {
    /// Build details from a stored URI. Unparsable URIs keep the raw string
    /// and leave the derived fields empty.
    pub fn from_uri(uri: &str, verb: Option<Verb>, response_code: Option<u16>) -> Self {
        let parsed = Url::parse(uri).ok();
        let scheme = parsed.as_ref().map(|url| url.scheme().to_string());
        let host = parsed.as_ref().and_then(|url| url.host_str().map(str::to_string));
        let params_query = parsed
            .as_ref()
            .map(|url| url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect())
            .unwrap_or_default();

        Self { response_code, url: uri.to_string(), scheme, host, verb, params_query }
    }

    /// Look up a query parameter by name
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.params_query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for CallDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------------------------------------------------")?;
        match self.response_code {
            Some(304) => writeln!(f, "Status code: 304 (Not Modified)")?,
            Some(code) => writeln!(f, "Status code: {code}")?,
            None => writeln!(f, "Status code: -")?,
        }
        writeln!(f)?;
        writeln!(f, "API Config:")?;
        writeln!(f, "\tProtocol: {}", self.scheme.as_deref().unwrap_or("-"))?;
        writeln!(f, "\tHost: {}", self.host.as_deref().unwrap_or("-"))?;
        writeln!(f, "\tVersion wrapper: {WRAPPER_VERSION}")?;
        writeln!(f)?;
        writeln!(f, "Call Info:")?;
        writeln!(f, "\tRequest type: {}", self.verb.map_or("-", Verb::as_str))?;
        writeln!(f, "\tGet Arguments:")?;
        for (key, value) in &self.params_query {
            writeln!(f, "\t\t{key} = {value}")?;
        }
        writeln!(f)?;
        writeln!(f, "Call url: {}", self.url)?;
        write!(f, "---------------------------------------------------")
    }
}
