//! Request signing for the Chef Server.

pub mod auth13;

pub use self::auth13::Auth13;
