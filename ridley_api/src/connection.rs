use crate::config::Config;
use crate::errors::ChefError;
use crate::session::Session;
use crate::transport::{HttpTransport, Method, Request, Response, Signer, Transport};
use crate::utils::organization_path;
use std::fmt;
use std::sync::Arc;

/// Something that can issue requests against an organization.
///
/// Paths passed to [`request`](#tymethod.request) are relative to the
/// organization, e.g. `nodes/web1`. Non-success statuses are returned as
/// errors via [`ChefError::from_status`].
pub trait Requester {
    fn organization(&self) -> &str;

    fn send(&self, request: &Request) -> Result<Response, ChefError>;

    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Response, ChefError> {
        let mut req = Request::new(method, &organization_path(self.organization(), path));
        if let Some(body) = body {
            req = req.with_body(body);
        }
        let res = self.send(&req)?;
        if res.is_success() {
            Ok(res)
        } else {
            debug!("{} {} failed with {}", req.method, req.path, res.status);
            Err(ChefError::from_status(res.status, path, res.body))
        }
    }
}

/// Entry point for talking to a Chef Server organization.
///
/// A `Connection` holds no per-call state and may be shared freely between
/// threads. Requests made directly on it each acquire and release their own
/// transport connection; use [`with_session`](#method.with_session) to reuse
/// one across several calls.
#[derive(Clone)]
pub struct Connection {
    organization: String,
    client_name: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Connection")
            .field("organization", &self.organization)
            .field("client_name", &self.client_name)
            .finish()
    }
}

impl Connection {
    pub fn new(config: Config) -> Result<Connection, ChefError> {
        let url = config.validate()?;
        let key = config.load_key()?;
        let signer = Signer {
            client_name: config.client_name.clone(),
            key,
            api_version: config.api_version.clone(),
        };
        let transport = HttpTransport::new(url, signer)?;
        info!(
            "Connecting to {} as {} for organization {}",
            config.server_url, config.client_name, config.organization
        );
        Ok(Connection {
            organization: config.organization,
            client_name: config.client_name,
            transport: Arc::new(transport),
        })
    }

    /// Build a connection from a knife style credentials profile.
    pub fn from_credentials(profile: Option<&str>) -> Result<Connection, ChefError> {
        Connection::new(Config::from_credentials(profile)?)
    }

    /// Use a caller supplied transport, which is then responsible for
    /// authenticating requests.
    pub fn with_transport(organization: &str, transport: Arc<dyn Transport>) -> Connection {
        Connection {
            organization: organization.into(),
            client_name: String::new(),
            transport,
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Run `body` with a session that keeps one transport connection open for
    /// every request issued through it. The connection is released when the
    /// body returns, fails or panics.
    pub fn with_session<F, T, E>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Session) -> Result<T, E>,
        E: From<ChefError>,
    {
        let channel = self.transport.connect()?;
        let session = Session::new(self, channel);
        body(&session)
    }

    /// Alias of [`with_session`](#method.with_session).
    pub fn start<F, T, E>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Session) -> Result<T, E>,
        E: From<ChefError>,
    {
        self.with_session(body)
    }
}

impl Requester for Connection {
    fn organization(&self) -> &str {
        &self.organization
    }

    fn send(&self, request: &Request) -> Result<Response, ChefError> {
        let mut channel = self.transport.connect()?;
        channel.send(request)
    }
}
