use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, ErrorKind};

///
/// A single injected response, registered through `PUT /mock`.
///
/// The `path` is contract-relative and literal: no templating is interpreted
/// at this layer, matching is exact-string against the already-resolved
/// request path. The optional `qs` scopes the override to requests whose
/// query string canonicalizes to the same signature, regardless of parameter
/// order or percent-encoding.
///
/// ## Example
///
/// ```
/// use mimic::MockBehavior;
///
/// let behavior = MockBehavior::from_json(
///     br#"{"method": "GET", "path": "/batman/location", "status": 201}"#,
/// ).unwrap();
///
/// assert_eq!(behavior.status, 201);
/// ```
///
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MockBehavior {
    /// HTTP verb, compared case-insensitively
    pub method: String,
    /// Contract-relative literal path, must start with `/`
    pub path: String,
    /// Status code to emit
    pub status: u16,
    /// Payload to emit: an arbitrary JSON value or a plain string.
    /// Absent means the response has no body.
    #[serde(default)]
    pub response: Option<Value>,
    /// Query string this override is scoped to
    #[serde(default)]
    pub qs: Option<String>,
}

impl MockBehavior {
    ///
    /// Parses a behavior from the JSON payload of an administrative request.
    /// Missing mandatory fields surface as `ErrorKind::InvalidBehavior`.
    ///
    pub fn from_json(payload: &[u8]) -> Result<MockBehavior, Error> {
        serde_json::from_slice(payload)
            .map_err(|err| Error::new_with_context(ErrorKind::InvalidBehavior, err))
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.method.trim().is_empty() {
            return Err(Error::new_with_context(
                ErrorKind::InvalidBehavior,
                "method must not be empty",
            ));
        }

        if !self.path.starts_with('/') {
            return Err(Error::new_with_context(
                ErrorKind::InvalidBehavior,
                format!("path {:?} must start with '/'", self.path),
            ));
        }

        if StatusCode::from_u16(self.status).is_err() {
            return Err(Error::new_with_context(
                ErrorKind::InvalidBehavior,
                format!("{} is not a valid status code", self.status),
            ));
        }

        Ok(())
    }
}
