//! Node resources for the Chef Server API.
//!
//! ```no_run
//! use ridley::{Connection, Config, Node, Resources};
//! # fn main() -> Result<(), ridley::ChefError> {
//! let connection = Connection::new(Config::new(
//!     "https://chef.example.com",
//!     "reset",
//!     "/home/reset/.chef/reset.pem",
//!     "vialstudios",
//! ))?;
//!
//! connection.with_session(|session| {
//!     session.node().create(&Node::new("ridley-one")?)?;
//!     assert_eq!(session.node().all()?.len(), 1);
//!     Ok(())
//! })
//! # }
//! ```

extern crate ridley_api;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;

#[macro_use]
mod macros;

pub mod models;
pub mod resources;

pub use ridley_api::{ChefError, Config, Connection, DeleteFailures, Requester, Session};

pub use crate::models::{Node, NodeList, Precedence};
pub use crate::resources::{NodeResource, Resources};
