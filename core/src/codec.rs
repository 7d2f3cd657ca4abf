//! Form encoding and merge-decoding of JSON responses.
//!
//! # Design
//! Deserializing straight into `T` with serde would replace the whole value,
//! wiping fields an earlier pipeline stage wrote. Instead the receptacle is
//! serialized to a `serde_json::Value`, the response is merged onto it key
//! by key, and the merged value is deserialized back. `*out` is assigned only
//! after that succeeds, so a failed decode never leaves a half-written value.
//!
//! The whole receptacle makes that round trip on every call, so it must
//! survive `to_value` then `from_value` unchanged. A non-finite `f64`
//! serializes as `null`, and a `#[serde(skip_serializing)]` field without a
//! default goes missing. Either one fails every decode with
//! [`ApiError::Decode`], even when the response never names that field.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::params::Params;

pub fn encode_form(params: &Params) -> String {
    params.encode()
}

/// Merge the JSON document in `body` onto `out`.
///
/// Fields present in the body overwrite the receptacle; fields absent from
/// it keep their current value. Nested objects merge recursively, every
/// other JSON value (arrays included) replaces what was there.
pub fn decode_merge<T>(body: &[u8], out: &mut T) -> Result<(), ApiError>
where
    T: Serialize + DeserializeOwned,
{
    let incoming: Value =
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    let mut current = serde_json::to_value(&*out).map_err(|e| ApiError::Decode(e.to_string()))?;
    merge_value(&mut current, incoming);
    *out = serde_json::from_value(current).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(())
}

fn merge_value(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match target.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}
