use bytes::Bytes;
use http::StatusCode;
use serde_json::Value;

use crate::behavior::MockBehavior;
use crate::contract::Operation;
use crate::error::{Error, ErrorKind};
use crate::store::MockStore;

/// Reserved administrative path, relative to the contract base path.
pub const MOCK_PATH: &str = "/mock";

///
/// Everything the resolver needs to know about one request, computed once at
/// the boundary and handed in as plain data.
///
#[derive(Debug)]
pub struct ResolvedRequest<'a> {
    /// Uppercased HTTP verb
    pub method: String,
    /// Contract-relative path, base path already stripped
    pub path: String,
    /// Raw query string, empty when the request carried none
    pub query: String,
    /// Request payload, only consulted for administrative registrations
    pub body: Bytes,
    /// The `SpecProvider`'s match result for this request, when one exists
    pub operation: Option<&'a Operation>,
}

///
/// Terminal outcome of the per-request state machine: the status and
/// optional payload to write back.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// Status code to emit
    pub status: StatusCode,
    /// Payload to emit, if any. String values render as plain text,
    /// everything else as serialized JSON.
    pub body: Option<Value>,
    /// Content type declared alongside a contract example, when the
    /// resolution came from one
    pub content_type: Option<String>,
}

impl Resolution {
    fn empty(status: StatusCode) -> Resolution {
        Resolution {
            status,
            body: None,
            content_type: None,
        }
    }
}

///
/// Decides what to send back for a resolved request, in a single pass with
/// terminal outcomes only. Precedence: the administrative `/mock` endpoint,
/// then a Mock Store hit, then the first declared contract example, then
/// `501 Not Implemented`.
///
/// An `ErrorKind::InvalidBehavior` failure from an administrative
/// registration propagates to the caller; the boundary maps it to
/// `400 Bad Request`.
///
pub fn resolve(request: &ResolvedRequest, store: &MockStore) -> Result<Resolution, Error> {
    if request.path == MOCK_PATH {
        return administrate(request, store);
    }

    let Some(operation) = request.operation else {
        log::debug!("{} {} is not part of the contract", request.method, request.path);
        return Ok(Resolution::empty(StatusCode::NOT_FOUND));
    };

    if let Some(behavior) = store.lookup(&request.method, &request.path, &request.query) {
        log::debug!("{} {} answered by an override", request.method, request.path);
        return Ok(Resolution {
            status: status_from(behavior.status)?,
            body: behavior.response,
            content_type: None,
        });
    }

    if let Some(entry) = operation.first_example() {
        log::debug!(
            "{} {} answered by the declared {} example",
            request.method,
            request.path,
            entry.status
        );
        return Ok(Resolution {
            status: status_from(entry.status)?,
            body: entry.example.clone(),
            content_type: entry.content_type.clone(),
        });
    }

    log::debug!("{} {} has no override and no example", request.method, request.path);
    Ok(Resolution::empty(StatusCode::NOT_IMPLEMENTED))
}

fn administrate(request: &ResolvedRequest, store: &MockStore) -> Result<Resolution, Error> {
    match request.method.as_str() {
        "DELETE" => {
            log::debug!("clearing all overrides");
            store.reset();
            Ok(Resolution::empty(StatusCode::NO_CONTENT))
        }
        "PUT" => {
            let behavior = MockBehavior::from_json(&request.body)?;
            store.save(behavior)?;
            Ok(Resolution::empty(StatusCode::NO_CONTENT))
        }
        _ => Ok(Resolution::empty(StatusCode::NOT_IMPLEMENTED)),
    }
}

// Behaviors and contracts are validated on the way in, so an out-of-range
// status here is a bug, not client error.
fn status_from(status: u16) -> Result<StatusCode, Error> {
    StatusCode::from_u16(status).map_err(|err| Error::new_with_context(ErrorKind::InternalFault, err))
}
