//! Plumbing for talking to a Chef Server: configuration, request signing,
//! transports, connections and session scopes.
//!
//! Resource clients live in the `ridley` crate and are built on the
//! [`Requester`](connection/trait.Requester.html) trait exported here.

#[macro_use]
extern crate log;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate serde_derive;

pub mod authentication;
pub mod config;
pub mod connection;
pub mod errors;
pub mod session;
pub mod transport;
pub mod utils;

pub use crate::config::Config;
pub use crate::connection::{Connection, Requester};
pub use crate::errors::{ChefError, DeleteFailures};
pub use crate::session::Session;
pub use crate::transport::{Channel, Method, Request, Response, Transport};
