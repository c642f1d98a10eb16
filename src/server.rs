use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::contract::{SpecProvider, SpecVerdict};
use crate::error::{Error, ErrorKind};
use crate::resolver::{self, ResolvedRequest, Resolution};
use crate::store::MockStore;

///
/// The HTTP boundary: accepts connections, turns wire requests into the
/// tuple the resolver needs and writes the resolver's decision back out.
///
/// Every connection shares the same store handle, so administrative resets
/// and overrides are visible to subsequent requests in program order.
///
pub struct Server {
    listener: TcpListener,
    address: SocketAddr,
    spec: Arc<dyn SpecProvider>,
    store: MockStore,
}

impl Server {
    ///
    /// Binds a listener on `address`. Passing port `0` picks a free port,
    /// which `address()` then reports.
    ///
    pub async fn bind(
        address: SocketAddr,
        spec: Arc<dyn SpecProvider>,
        store: MockStore,
    ) -> Result<Server, Error> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|err| Error::new_with_context(ErrorKind::ServerFailure, err))?;
        let address = listener
            .local_addr()
            .map_err(|err| Error::new_with_context(ErrorKind::ServerFailure, err))?;

        Ok(Server {
            listener,
            address,
            spec,
            store,
        })
    }

    ///
    /// The address the server is listening on.
    ///
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    ///
    /// Accepts and serves connections until the process ends. Individual
    /// request failures are logged and answered, never fatal.
    ///
    pub async fn serve(self) -> Result<(), Error> {
        log::info!("the mock api is now running at http://{}", self.address);

        loop {
            let (stream, remote) = match self.listener.accept().await {
                Ok(connection) => connection,
                Err(err) => {
                    log::warn!("could not accept a connection: {}", err);
                    continue;
                }
            };

            let spec = self.spec.clone();
            let store = self.store.clone();

            tokio::spawn(async move {
                let service = service_fn(move |request: Request<Incoming>| {
                    let spec = spec.clone();
                    let store = store.clone();
                    async move {
                        Ok::<_, std::convert::Infallible>(handle(request, spec.as_ref(), &store).await)
                    }
                });

                let builder = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
                let connection = builder
                    .serve_connection(TokioIo::new(stream), service);
                if let Err(err) = connection.await {
                    log::debug!("connection from {} ended with an error: {}", remote, err);
                }
            });
        }
    }
}

async fn handle(
    request: Request<Incoming>,
    spec: &dyn SpecProvider,
    store: &MockStore,
) -> Response<Full<Bytes>> {
    match respond(request, spec, store).await {
        Ok(response) => response,
        Err(error) => {
            let status = match error.kind {
                ErrorKind::InvalidBehavior => {
                    log::debug!("rejected an override registration: {}", error);
                    StatusCode::BAD_REQUEST
                }
                _ => {
                    log::error!("request failed: {}", error);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            empty_response(status)
        }
    }
}

async fn respond(
    request: Request<Incoming>,
    spec: &dyn SpecProvider,
    store: &MockStore,
) -> Result<Response<Full<Bytes>>, Error> {
    let (head, body) = request.into_parts();
    let method = head.method.as_str().to_uppercase();
    let path = head.uri.path().to_owned();
    let query = head.uri.query().unwrap_or("").to_owned();

    let Some(relative) = strip_base_path(&path, spec.base_path()) else {
        log::debug!("{} {} is outside the contract base path", method, path);
        return Ok(empty_response(StatusCode::NOT_FOUND));
    };

    let operation = if relative == resolver::MOCK_PATH {
        None
    } else {
        match spec.match_operation(&method, relative) {
            SpecVerdict::Operation(operation) => Some(operation),
            SpecVerdict::PathShapeMismatch => {
                log::debug!("{} {} fails the declared parameter shapes", method, path);
                return Ok(empty_response(StatusCode::BAD_REQUEST));
            }
            SpecVerdict::NoSuchOperation => None,
        }
    };

    let body = body
        .collect()
        .await
        .map_err(|err| Error::new_with_context(ErrorKind::RequestBodyFailure, err))?
        .to_bytes();

    let resolved = ResolvedRequest {
        method,
        path: relative.to_owned(),
        query,
        body,
        operation,
    };

    render(resolver::resolve(&resolved, store)?)
}

fn strip_base_path<'a>(path: &'a str, base_path: &str) -> Option<&'a str> {
    if base_path.is_empty() || base_path == "/" {
        return Some(path);
    }

    let remainder = path.strip_prefix(base_path)?;
    if remainder.is_empty() {
        Some("/")
    } else if remainder.starts_with('/') {
        Some(remainder)
    } else {
        None
    }
}

// String payloads render as plain text, everything else as serialized JSON,
// matching how documented examples read: a "batcave" example comes back as
// the text batcave, not as a quoted JSON string.
fn render(resolution: Resolution) -> Result<Response<Full<Bytes>>, Error> {
    let (bytes, inferred) = match resolution.body {
        None => (Bytes::new(), None),
        Some(Value::String(text)) => (Bytes::from(text), Some("text/plain; charset=utf-8")),
        Some(value) => {
            let serialized = serde_json::to_vec(&value)
                .map_err(|err| Error::new_with_context(ErrorKind::ResponseFailure, err))?;
            (Bytes::from(serialized), Some("application/json"))
        }
    };

    let mut response = Response::new(Full::new(bytes));
    *response.status_mut() = resolution.status;

    if let Some(content_type) = resolution.content_type.as_deref().or(inferred) {
        let value = HeaderValue::from_str(content_type)
            .map_err(|err| Error::new_with_context(ErrorKind::ResponseFailure, err))?;
        response.headers_mut().insert(CONTENT_TYPE, value);
    }

    Ok(response)
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
