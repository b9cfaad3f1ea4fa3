//! Response tuple returned to the backend adapter.

use crate::error::FacadeError;
use crate::types::request::Headers;
use serde_json::Value;

/// `[status, body, headers, statusText]` as handed back to the adapter.
///
/// The body is already JSON-serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub headers: Headers,
    pub status_text: String,
}

impl Response {
    /// Serialize `data` as the body of a response with the given status.
    pub fn json(status: u16, data: &Value) -> Self {
        Self {
            status,
            body: data.to_string(),
            headers: Headers::new(),
            status_text: "OK".to_string(),
        }
    }

    pub fn ok(data: &Value) -> Self {
        Self::json(200, data)
    }

    /// Parse the serialized body back into JSON.
    pub fn body_json(&self) -> Result<Value, FacadeError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn into_tuple(self) -> (u16, String, Headers, String) {
        (self.status, self.body, self.headers, self.status_text)
    }
}

impl TryFrom<Value> for Response {
    type Error = FacadeError;

    /// Accepts exactly `[status, data, headers, statusText]`.
    ///
    /// `headers` may be `null` or an object of string values.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let invalid = |reason: &str, value: &Value| {
            FacadeError::InvalidResponse(format!(
                "{reason}; expected [status, data, headers, statusText], got {value}"
            ))
        };

        let Value::Array(parts) = &value else {
            return Err(invalid("response is not an array", &value));
        };
        let [status, data, headers, status_text] = parts.as_slice() else {
            return Err(invalid("response must have exactly 4 elements", &value));
        };

        let status = status
            .as_u64()
            .and_then(|s| u16::try_from(s).ok())
            .ok_or_else(|| invalid("status must be an integer status code", &value))?;

        let headers = match headers {
            Value::Null => Headers::new(),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    _ => Err(invalid("header values must be strings", &value)),
                })
                .collect::<Result<Headers, _>>()?,
            _ => return Err(invalid("headers must be an object", &value)),
        };

        let status_text = status_text
            .as_str()
            .ok_or_else(|| invalid("statusText must be a string", &value))?
            .to_string();

        Ok(Self {
            status,
            body: data.to_string(),
            headers,
            status_text,
        })
    }
}
