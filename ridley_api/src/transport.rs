//! The transport seam: how signed requests reach a Chef Server.
//!
//! A [`Transport`] hands out [`Channel`]s; each channel is one live connection
//! to the server and is released when dropped.

use crate::authentication::auth13::Auth13;
use crate::errors::ChefError;
use crate::utils::squeeze_path;

use futures::future::poll_fn;
use hyper::client::conn::{self, SendRequest};
use hyper::header::{ACCEPT, CONTENT_TYPE, HOST};
use hyper::service::Service;
use hyper::{Body, Uri};
use hyper_openssl::HttpsConnector;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Runtime;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request with an absolute server path, e.g. `/organizations/acme/nodes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<String>,
}

impl Request {
    pub fn new(method: Method, path: &str) -> Request {
        Request {
            method,
            path: squeeze_path(path),
            body: None,
        }
    }

    pub fn with_body(mut self, body: String) -> Request {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub fn json(&self) -> Result<serde_json::Value, ChefError> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// One acquired connection to the server.
pub trait Channel: Send {
    fn send(&mut self, request: &Request) -> Result<Response, ChefError>;
}

/// Source of connections. Implementations attach authentication to every
/// request they send.
pub trait Transport: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Channel>, ChefError>;
}

/// Identity used to sign each request.
#[derive(Clone)]
pub struct Signer {
    pub client_name: String,
    pub key: Vec<u8>,
    pub api_version: String,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Signer")
            .field("client_name", &self.client_name)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// HTTP(S) transport using hyper on a private tokio runtime. Every
/// `connect` performs a fresh handshake; requests on the resulting channel
/// all travel over that one connection.
pub struct HttpTransport {
    base: Url,
    signer: Signer,
    runtime: Arc<Runtime>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base", &self.base.as_str())
            .field("signer", &self.signer)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(base: Url, signer: Signer) -> Result<HttpTransport, ChefError> {
        let runtime = Runtime::new()
            .map_err(|e| ChefError::Configuration(format!("unable to start runtime: {}", e)))?;
        Ok(HttpTransport {
            base,
            signer,
            runtime: Arc::new(runtime),
        })
    }

    fn authority(&self) -> Result<Uri, ChefError> {
        let host = self
            .base
            .host_str()
            .ok_or_else(|| ChefError::Configuration(format!("no host in {}", self.base)))?;
        let port = self
            .base
            .port_or_known_default()
            .ok_or_else(|| ChefError::Configuration(format!("no port for {}", self.base)))?;
        format!("{}://{}:{}", self.base.scheme(), host, port)
            .parse::<Uri>()
            .map_err(|e| ChefError::Configuration(e.to_string()))
    }
}

impl Transport for HttpTransport {
    fn connect(&self) -> Result<Box<dyn Channel>, ChefError> {
        let uri = self.authority()?;
        debug!("Opening connection to {}", uri);

        let sender = self.runtime.block_on(async {
            let mut connector =
                HttpsConnector::new().map_err(|e| ChefError::Transport(e.into()))?;
            poll_fn(|cx| connector.poll_ready(cx))
                .await
                .map_err(|e| ChefError::Transport(failure::Error::from_boxed_compat(e)))?;
            let stream = connector
                .call(uri)
                .await
                .map_err(|e| ChefError::Transport(failure::Error::from_boxed_compat(e)))?;
            let (sender, connection) = conn::handshake(stream).await?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!("Connection closed with error: {}", e);
                }
            });
            Ok::<SendRequest<Body>, ChefError>(sender)
        })?;

        Ok(Box::new(HttpChannel {
            base: self.base.clone(),
            signer: self.signer.clone(),
            runtime: Arc::clone(&self.runtime),
            sender,
        }))
    }
}

struct HttpChannel {
    base: Url,
    signer: Signer,
    runtime: Arc<Runtime>,
    sender: SendRequest<Body>,
}

/// Build the signed hyper request for `request`. The base URL may carry a
/// path prefix, e.g. a reverse proxy mount, which is joined onto the request
/// path before signing.
fn build_request(
    base: &Url,
    signer: &Signer,
    request: &Request,
) -> Result<hyper::Request<Body>, ChefError> {
    let path = squeeze_path(&format!("{}/{}", base.path(), request.path));
    let host = match (base.host_str(), base.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_owned(),
        (None, _) => {
            return Err(ChefError::Configuration(format!("no host in {}", base)));
        }
    };

    let auth = Auth13::new(
        &path,
        &signer.key,
        request.method.as_str(),
        &signer.client_name,
        &signer.api_version,
        request.body.clone(),
    );

    let mut builder = hyper::Request::builder()
        .method(request.method.as_str())
        .uri(path.as_str())
        .header(HOST, host.as_str())
        .header(ACCEPT, "application/json")
        .header(CONTENT_TYPE, "application/json")
        .header("X-Chef-Version", "12.0.0")
        .header("X-Ops-Server-API-Version", signer.api_version.as_str());
    for (name, value) in auth.headers()? {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let body = match request.body {
        Some(ref b) => Body::from(b.clone()),
        None => Body::empty(),
    };
    Ok(builder.body(body)?)
}

impl Channel for HttpChannel {
    fn send(&mut self, request: &Request) -> Result<Response, ChefError> {
        let req = build_request(&self.base, &self.signer, request)?;
        debug!("{} {}", request.method, request.path);

        let sender = &mut self.sender;
        self.runtime.block_on(async {
            poll_fn(|cx| sender.poll_ready(cx)).await?;
            let res = sender.send_request(req).await?;
            let status = res.status().as_u16();
            let bytes = hyper::body::to_bytes(res.into_body()).await?;
            let body = String::from_utf8_lossy(&bytes).into_owned();
            debug!("{} {} -> {}", request.method, request.path, status);
            Ok::<Response, ChefError>(Response { status, body })
        })
    }
}

impl Drop for HttpChannel {
    fn drop(&mut self) {
        debug!("Releasing connection to {}", self.base);
    }
}
