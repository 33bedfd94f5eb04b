pub mod attributes;
pub mod node;

pub use self::attributes::{Attributes, Precedence};
pub use self::node::{Node, NodeList};
