use crate::connection::{Connection, Requester};
use crate::errors::ChefError;
use crate::transport::{Channel, Request, Response};
use std::fmt;
use std::sync::Mutex;

/// A scope holding one transport connection open. Created by
/// [`Connection::with_session`]; requests issued through it run in order over
/// the same connection, which is released when the session is dropped.
pub struct Session<'c> {
    connection: &'c Connection,
    channel: Mutex<Box<dyn Channel>>,
}

impl<'c> fmt::Debug for Session<'c> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Session")
            .field("connection", self.connection)
            .finish()
    }
}

impl<'c> Session<'c> {
    pub(crate) fn new(connection: &'c Connection, channel: Box<dyn Channel>) -> Session<'c> {
        debug!("Session started for {}", connection.organization());
        Session {
            connection,
            channel: Mutex::new(channel),
        }
    }

    pub fn connection(&self) -> &'c Connection {
        self.connection
    }
}

impl<'c> Requester for Session<'c> {
    fn organization(&self) -> &str {
        self.connection.organization()
    }

    fn send(&self, request: &Request) -> Result<Response, ChefError> {
        // A panic in an earlier call poisons the lock but leaves the channel
        // usable.
        let mut channel = match self.channel.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        channel.send(request)
    }
}

impl<'c> Drop for Session<'c> {
    fn drop(&mut self) {
        debug!("Session ended for {}", self.connection.organization());
    }
}
