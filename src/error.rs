use std::error::Error as ErrorTrait;
use std::fmt::Display;

///
/// Contains information about an error occurence
///
#[derive(Debug)]
pub struct Error {
    /// The type of this error
    pub kind: ErrorKind,
    /// Some errors come with more context
    pub context: Option<String>,
}

impl Error {
    pub(crate) fn new_with_context(kind: ErrorKind, context: impl Display) -> Error {
        Error {
            kind,
            context: Some(context.to_string()),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (context: {})",
            self.kind.description(),
            self.context.as_ref().unwrap_or(&"none".to_string())
        )
    }
}

impl ErrorTrait for Error {}

///
/// The type of an error
///
#[derive(Debug)]
pub enum ErrorKind {
    /// The override behavior is malformed: missing fields, an unrooted path
    /// or an invalid status code
    InvalidBehavior,
    /// The contract description can't be loaded or fails validation
    InvalidContract,
    /// The server socket could not be set up
    ServerFailure,
    /// Failed to read the request body
    RequestBodyFailure,
    /// Could not deliver a response
    ResponseFailure,
    /// An unexpected failure during response resolution
    InternalFault,
}

impl ErrorKind {
    fn description(&self) -> &'static str {
        match self {
            ErrorKind::InvalidBehavior => "the override behavior is malformed",
            ErrorKind::InvalidContract => "the contract description is invalid",
            ErrorKind::ServerFailure => "the server socket could not be set up",
            ErrorKind::RequestBodyFailure => "failed to read the request body",
            ErrorKind::ResponseFailure => "could not deliver a response",
            ErrorKind::InternalFault => "unexpected failure during resolution",
        }
    }
}
