//! Request body encoding

use digirest_domain::{
    json_object_fields, ContentType, DigirestError, FormValue, RequestBody, Result,
};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::ports::EncodedBody;

/// Percent-encode pairs the way an HTML form does (`+` for spaces)
pub fn encode_form_pairs<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    serializer.finish()
}

/// Encode a body for the effective content type.
///
/// Raw bodies are sent verbatim for JSON and form content. Multipart keeps
/// the fields so the transport can attach files.
///
/// # Errors
/// Returns `Config` when the body cannot be represented in `content_type`
pub fn encode_body(content_type: ContentType, body: &RequestBody) -> Result<EncodedBody> {
    match (content_type, body) {
        (_, RequestBody::Empty) => Ok(EncodedBody::Empty),

        (ContentType::Json, RequestBody::Raw(text))
        | (ContentType::FormUrlEncoded, RequestBody::Raw(text)) => {
            Ok(EncodedBody::Text(text.clone()))
        }
        (ContentType::Json, RequestBody::Json(value)) => {
            Ok(EncodedBody::Text(serde_json::to_string(value)?))
        }
        (ContentType::Json, RequestBody::Fields(fields)) => {
            let object: Map<String, Value> = fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.to_string())))
                .collect();
            Ok(EncodedBody::Text(serde_json::to_string(&object)?))
        }

        (ContentType::FormUrlEncoded, RequestBody::Fields(fields)) => {
            let pairs: Vec<(&str, String)> =
                fields.iter().map(|(k, v)| (k.as_str(), v.to_string())).collect();
            Ok(EncodedBody::Text(encode_form_pairs(&pairs)))
        }
        (ContentType::FormUrlEncoded, RequestBody::Json(value)) => {
            let pairs = json_object_fields(value)?;
            Ok(EncodedBody::Text(encode_form_pairs(&pairs)))
        }

        (ContentType::MultipartForm, RequestBody::Fields(fields)) => {
            Ok(EncodedBody::Multipart(fields.clone()))
        }
        (ContentType::MultipartForm, RequestBody::Json(value)) => {
            let fields = json_object_fields(value)?
                .into_iter()
                .map(|(k, v)| (k, FormValue::Text(v)))
                .collect();
            Ok(EncodedBody::Multipart(fields))
        }
        (ContentType::MultipartForm, RequestBody::Raw(_)) => {
            Err(DigirestError::config("a raw body cannot be sent as multipart/form-data"))
        }
    }
}
