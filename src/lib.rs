#![warn(missing_docs)]

//!
//! Mimic is a contract-driven HTTP mock server: point it at a machine-readable
//! API description and it answers every declared operation with the first
//! documented example response, until you inject an override for a specific
//! request signature. It exists so API consumers can develop against a fake
//! implementation of a not-yet-built or third-party service, with behavior
//! overridable per-test.
//!
//! All mock state is ephemeral and lives for the process lifetime.
//!
//! # Getting Started
//!
//! Run the server against a contract description:
//!
//! ```sh
//! mimic --port 15009 --spec ./contract.json
//! ```
//!
//! A contract description declares a base path and its operations, each with
//! the responses it documents:
//!
//! ```json
//! {
//!   "base_path": "/api",
//!   "operations": [
//!     {
//!       "method": "GET",
//!       "path": "/batman/location",
//!       "responses": [
//!         { "status": 500 },
//!         { "status": 200, "example": "batcave" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `GET /api/batman/location` now answers `200` with the body `batcave`. An
//! operation whose responses carry no example answers `501 Not Implemented`,
//! and a path outside the contract answers `404 Not Found`.
//!
//! # Overriding responses
//!
//! The reserved `/mock` path under the base path is the administrative
//! endpoint. `PUT` a behavior to it and that behavior takes precedence over
//! the contract's example for the matching requests:
//!
//! ```sh
//! curl -X PUT http://localhost:15009/api/mock \
//!   -d '{"method": "GET", "path": "/batman/location", "status": 201, "response": {"arkham": "asylum"}}'
//! ```
//!
//! Registering a second behavior for the same method, path and query
//! signature overwrites the first. A behavior saved with a `qs` query string
//! only answers requests whose query canonicalizes to the same signature,
//! regardless of parameter order or percent-encoding.
//!
//! # Resetting
//!
//! `DELETE /api/mock` removes all overrides and falls back to contract-default
//! resolution. Test suites typically do this in their setup:
//!
//! ```sh
//! curl -X DELETE http://localhost:15009/api/mock
//! ```
//!
//! # Embedding
//!
//! The resolution engine is plain data in, plain data out, and can be driven
//! without a socket:
//!
//! ```
//! use mimic::{Contract, MockStore, ResolvedRequest, SpecProvider, SpecVerdict, resolve};
//! use serde_json::json;
//!
//! let contract: Contract = serde_json::from_value(json!({
//!     "operations": [{
//!         "method": "GET",
//!         "path": "/batman/location",
//!         "responses": [{ "status": 200, "example": "batcave" }]
//!     }]
//! })).unwrap();
//!
//! let store = MockStore::new();
//! let operation = match contract.match_operation("GET", "/batman/location") {
//!     SpecVerdict::Operation(operation) => Some(operation),
//!     _ => None,
//! };
//!
//! let request = ResolvedRequest {
//!     method: "GET".to_string(),
//!     path: "/batman/location".to_string(),
//!     query: String::new(),
//!     body: bytes::Bytes::new(),
//!     operation,
//! };
//!
//! let resolution = resolve(&request, &store).unwrap();
//! assert_eq!(resolution.status, 200);
//! assert_eq!(resolution.body, Some(json!("batcave")));
//! ```
//!

mod behavior;
mod contract;
mod error;
mod query;
mod resolver;
mod server;
mod store;

pub use behavior::MockBehavior;
pub use contract::{Contract, Operation, ResponseEntry, SpecProvider, SpecVerdict};
pub use error::{Error, ErrorKind};
pub use query::{canonicalize, canonicalize_pairs};
pub use resolver::{resolve, ResolvedRequest, Resolution, MOCK_PATH};
pub use server::Server;
pub use store::MockStore;
