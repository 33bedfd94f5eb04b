use std::fmt;
use std::io;

#[derive(Debug, Fail)]
pub enum ChefError {
    #[fail(display = "Configuration error: {}", _0)]
    Configuration(String),
    #[fail(display = "Invalid resource: {}", _0)]
    Validation(String),
    #[fail(display = "Resource not found: {}", _0)]
    NotFound(String),
    #[fail(display = "Resource already exists: {}", _0)]
    Conflict(String),
    #[fail(display = "{}", _0)]
    Aggregate(DeleteFailures),
    #[fail(display = "Authentication failed: {}", _0)]
    Authentication(String),
    #[fail(display = "Server returned HTTP {}: {}", status, body)]
    Http { status: u16, body: String },
    #[fail(display = "Transport error: {}", _0)]
    Transport(failure::Error),
    #[fail(display = "Failed to decode JSON: {}", _0)]
    Json(String),
    #[fail(display = "Unable to sign request: {}", _0)]
    KeyError(String),
}

impl ChefError {
    /// Map a non-success status to the matching error. `resource` names what
    /// was being addressed and is used as the message for the well-known
    /// statuses.
    pub fn from_status(status: u16, resource: &str, body: String) -> ChefError {
        match status {
            400 => ChefError::Validation(format!("{}: {}", resource, body)),
            401 | 403 => ChefError::Authentication(format!("{}: {}", resource, body)),
            404 => ChefError::NotFound(resource.into()),
            409 => ChefError::Conflict(resource.into()),
            _ => ChefError::Http { status, body },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(*self, ChefError::NotFound(_))
    }
}

/// Per-node failures collected by a bulk delete.
#[derive(Debug, Default)]
pub struct DeleteFailures {
    pub failures: Vec<(String, ChefError)>,
}

impl DeleteFailures {
    pub fn push(&mut self, name: String, err: ChefError) {
        self.failures.push((name, err));
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Display for DeleteFailures {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Failed to delete {} node(s)", self.failures.len())?;
        for (name, err) in &self.failures {
            write!(f, "; {}: {}", name, err)?;
        }
        Ok(())
    }
}

impl From<serde_json::Error> for ChefError {
    fn from(e: serde_json::Error) -> ChefError {
        ChefError::Json(e.to_string())
    }
}

impl From<openssl::error::ErrorStack> for ChefError {
    fn from(e: openssl::error::ErrorStack) -> ChefError {
        ChefError::KeyError(e.to_string())
    }
}

impl From<hyper::Error> for ChefError {
    fn from(e: hyper::Error) -> ChefError {
        ChefError::Transport(e.into())
    }
}

impl From<hyper::http::Error> for ChefError {
    fn from(e: hyper::http::Error) -> ChefError {
        ChefError::Transport(e.into())
    }
}

impl From<io::Error> for ChefError {
    fn from(e: io::Error) -> ChefError {
        ChefError::Transport(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(ChefError::from_status(404, "node web1", String::new()).is_not_found());
        match ChefError::from_status(409, "node web1", String::new()) {
            ChefError::Conflict(msg) => assert_eq!(msg, "node web1"),
            other => panic!("unexpected {:?}", other),
        }
        match ChefError::from_status(401, "nodes", "bad sig".into()) {
            ChefError::Authentication(_) => {}
            other => panic!("unexpected {:?}", other),
        }
        match ChefError::from_status(500, "nodes", "boom".into()) {
            ChefError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_delete_failures_display() {
        let mut failures = DeleteFailures::default();
        failures.push("one".into(), ChefError::Http { status: 500, body: "boom".into() });
        failures.push("two".into(), ChefError::Authentication("nodes/two: denied".into()));
        let err = ChefError::Aggregate(failures);
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to delete 2 node(s)"));
        assert!(msg.contains("one: Server returned HTTP 500: boom"));
        assert!(msg.contains("two: Authentication failed"));
    }
}
