use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, ErrorKind};

///
/// The reduced contract model the mock server works from: the operations an
/// API description declares, with their example responses in declaration
/// order. Parsing the API description format itself (OpenAPI documents,
/// `$ref` resolution, schema validation) is a concern of whatever produced
/// this value.
///
/// A `Contract` is itself a `SpecProvider` and can be deserialized from
/// JSON:
///
/// ## Example
///
/// ```
/// use mimic::Contract;
/// use serde_json::json;
///
/// let contract: Contract = serde_json::from_value(json!({
///     "base_path": "/api",
///     "operations": [{
///         "method": "GET",
///         "path": "/batman/location",
///         "responses": [{ "status": 200, "example": "batcave" }]
///     }]
/// })).unwrap();
/// ```
///
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Contract {
    /// Prefix under which every operation, and the administrative endpoint,
    /// is mounted
    #[serde(default)]
    pub base_path: String,
    /// Declared operations, in declaration order
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Contract {
    ///
    /// Loads and validates a contract description from a JSON file.
    ///
    pub fn from_file(path: impl AsRef<Path>) -> Result<Contract, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            Error::new_with_context(ErrorKind::InvalidContract, format!("{}: {}", path.display(), err))
        })?;

        let contract: Contract = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| Error::new_with_context(ErrorKind::InvalidContract, err))?;

        contract.validate()?;
        Ok(contract)
    }

    fn validate(&self) -> Result<(), Error> {
        for operation in &self.operations {
            if !operation.path.starts_with('/') {
                return Err(Error::new_with_context(
                    ErrorKind::InvalidContract,
                    format!("operation path {:?} must start with '/'", operation.path),
                ));
            }

            for entry in &operation.responses {
                if StatusCode::from_u16(entry.status).is_err() {
                    return Err(Error::new_with_context(
                        ErrorKind::InvalidContract,
                        format!("{} {} declares the invalid status {}", operation.method, operation.path, entry.status),
                    ));
                }
            }
        }

        Ok(())
    }
}

///
/// A (method, path template) pair declared in the contract, with its
/// declared responses.
///
#[derive(Clone, Debug, Deserialize)]
pub struct Operation {
    /// HTTP verb, compared case-insensitively
    pub method: String,
    /// Path template. `{name}` segments match any token, `{name:integer}`
    /// segments only match digit tokens.
    pub path: String,
    /// Declared responses, in declaration order
    #[serde(default)]
    pub responses: Vec<ResponseEntry>,
}

impl Operation {
    ///
    /// The first declared response carrying a literal example, if any.
    /// Later entries are never considered, even if they also have examples.
    ///
    pub fn first_example(&self) -> Option<&ResponseEntry> {
        self.responses.iter().find(|entry| entry.example.is_some())
    }
}

///
/// One declared response of an operation.
///
#[derive(Clone, Debug, Deserialize)]
pub struct ResponseEntry {
    /// Declared status code
    pub status: u16,
    /// Content type the example was declared under
    #[serde(default)]
    pub content_type: Option<String>,
    /// Literal example payload, if the contract documents one
    #[serde(default)]
    pub example: Option<Value>,
}

///
/// A `SpecProvider`'s verdict for a (method, path) pair.
///
#[derive(Debug)]
pub enum SpecVerdict<'a> {
    /// The path and method matched this declared operation
    Operation(&'a Operation),
    /// A template for this path exists, but a declared parameter shape is
    /// not satisfied. Rejected with `400 Bad Request` before resolution.
    PathShapeMismatch,
    /// Nothing is declared for this path and method
    NoSuchOperation,
}

///
/// Read-only, synchronous view of a loaded contract: decides whether a
/// request is part of the contract and supplies the declared responses of
/// the matched operation. The resolver consumes the verdict as plain data.
///
pub trait SpecProvider: Send + Sync {
    /// Prefix the contract is mounted under, empty for the root
    fn base_path(&self) -> &str;

    /// Matches a contract-relative path and method against the declared
    /// operations
    fn match_operation(&self, method: &str, path: &str) -> SpecVerdict<'_>;
}

impl SpecProvider for Contract {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn match_operation(&self, method: &str, path: &str) -> SpecVerdict<'_> {
        let mut shape_mismatch = false;

        for operation in &self.operations {
            if !operation.method.eq_ignore_ascii_case(method) {
                continue;
            }

            match match_template(&operation.path, path) {
                TemplateMatch::Match => return SpecVerdict::Operation(operation),
                TemplateMatch::ShapeMismatch => shape_mismatch = true,
                TemplateMatch::NoMatch => {}
            }
        }

        if shape_mismatch {
            SpecVerdict::PathShapeMismatch
        } else {
            SpecVerdict::NoSuchOperation
        }
    }
}

enum TemplateMatch {
    Match,
    ShapeMismatch,
    NoMatch,
}

fn match_template(template: &str, path: &str) -> TemplateMatch {
    let template_segments: Vec<&str> = template.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();

    if template_segments.len() != path_segments.len() {
        return TemplateMatch::NoMatch;
    }

    let mut verdict = TemplateMatch::Match;
    for (expected, actual) in template_segments.iter().zip(&path_segments) {
        match parse_parameter(expected) {
            Some(shape) => {
                if actual.is_empty() {
                    return TemplateMatch::NoMatch;
                }
                if !shape.admits(actual) {
                    verdict = TemplateMatch::ShapeMismatch;
                }
            }
            None => {
                if expected != actual {
                    return TemplateMatch::NoMatch;
                }
            }
        }
    }

    verdict
}

enum ParameterShape {
    Any,
    Integer,
}

impl ParameterShape {
    fn admits(&self, token: &str) -> bool {
        match self {
            ParameterShape::Any => true,
            ParameterShape::Integer => token.bytes().all(|byte| byte.is_ascii_digit()),
        }
    }
}

fn parse_parameter(segment: &str) -> Option<ParameterShape> {
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;

    match inner.split_once(':') {
        Some((_, "integer")) => Some(ParameterShape::Integer),
        _ => Some(ParameterShape::Any),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Contract, SpecProvider, SpecVerdict};

    fn contract() -> Contract {
        serde_json::from_value(json!({
            "base_path": "/api",
            "operations": [
                {
                    "method": "GET",
                    "path": "/batman/location",
                    "responses": [
                        { "status": 500 },
                        { "status": 200, "example": "batcave" }
                    ]
                },
                {
                    "method": "GET",
                    "path": "/villains/{id:integer}/profile",
                    "responses": [{ "status": 200, "example": { "alias": "unknown" } }]
                },
                {
                    "method": "GET",
                    "path": "/gotham/{district}/status",
                    "responses": [{ "status": 200, "example": "quiet" }]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn literal_paths_match_exactly() {
        let contract = contract();

        assert!(matches!(
            contract.match_operation("GET", "/batman/location"),
            SpecVerdict::Operation(_)
        ));
        assert!(matches!(
            contract.match_operation("GET", "/batman/location/extra"),
            SpecVerdict::NoSuchOperation
        ));
    }

    #[test]
    fn methods_are_compared_case_insensitively_and_distinguished() {
        let contract = contract();

        assert!(matches!(
            contract.match_operation("get", "/batman/location"),
            SpecVerdict::Operation(_)
        ));
        assert!(matches!(
            contract.match_operation("POST", "/batman/location"),
            SpecVerdict::NoSuchOperation
        ));
    }

    #[test]
    fn template_parameters_match_any_token() {
        let contract = contract();

        assert!(matches!(
            contract.match_operation("GET", "/gotham/narrows/status"),
            SpecVerdict::Operation(_)
        ));
    }

    #[test]
    fn constrained_parameters_reject_non_conforming_tokens() {
        let contract = contract();

        assert!(matches!(
            contract.match_operation("GET", "/villains/42/profile"),
            SpecVerdict::Operation(_)
        ));
        assert!(matches!(
            contract.match_operation("GET", "/villains/joker/profile"),
            SpecVerdict::PathShapeMismatch
        ));
    }

    #[test]
    fn first_declared_example_wins() {
        let contract = contract();
        let SpecVerdict::Operation(operation) = contract.match_operation("GET", "/batman/location")
        else {
            panic!("expected a match");
        };

        let entry = operation.first_example().unwrap();
        assert_eq!(entry.status, 200);
    }
}
