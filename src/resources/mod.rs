pub mod node;

pub use self::node::NodeResource;

use ridley_api::Requester;

/// Resource clients available on anything that can issue requests, so both
/// `connection.node()` and `session.node()` work.
pub trait Resources: Requester {
    fn node(&self) -> NodeResource<'_, Self> {
        NodeResource::new(self)
    }
}

impl<R: Requester + ?Sized> Resources for R {}
