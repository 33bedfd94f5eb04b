use crate::models::node::{Node, NodeList};
use ridley_api::errors::{ChefError, DeleteFailures};
use ridley_api::transport::Method;
use ridley_api::Requester;
use serde_json::Value;
use std::collections::HashMap;
use std::convert::TryFrom;

const NODES: &str = "nodes";

/// CRUD and bulk operations on an organization's nodes.
///
/// Bound to either a [`Connection`](../../ridley_api/connection/struct.Connection.html),
/// where each call opens its own transport connection, or a
/// [`Session`](../../ridley_api/session/struct.Session.html), where every call
/// shares the session's connection.
#[derive(Debug)]
pub struct NodeResource<'a, R: Requester + ?Sized> {
    client: &'a R,
}

impl<'a, R: Requester + ?Sized> Clone for NodeResource<'a, R> {
    fn clone(&self) -> Self {
        NodeResource {
            client: self.client,
        }
    }
}

impl<'a, R: Requester + ?Sized> NodeResource<'a, R> {
    pub fn new(client: &'a R) -> NodeResource<'a, R> {
        NodeResource { client }
    }

    /// Create `node` on the server. Fails with `Conflict` if a node of that
    /// name already exists.
    pub fn create(&self, node: &Node) -> Result<Node, ChefError> {
        node.validate()?;
        let local = node.to_json()?;
        info!("Creating node {}", node.name);
        let res = self
            .client
            .request(Method::Post, NODES, Some(serde_json::to_string(&local)?))?;
        confirm(local, res.json()?)
    }

    /// Create a node from a bare attribute document, e.g.
    /// `{"name": "ridley-one"}`.
    pub fn create_from(&self, attrs: Value) -> Result<Node, ChefError> {
        self.create(&Node::try_from(attrs)?)
    }

    /// Fetch one node. A node the server doesn't know about is `Ok(None)`.
    pub fn find(&self, name: &str) -> Result<Option<Node>, ChefError> {
        check_name(name)?;
        match self.client.request(Method::Get, &node_path(name), None) {
            Ok(res) => Ok(Some(Node::try_from(res.json()?)?)),
            Err(ref e) if e.is_not_found() => {
                debug!("Node {} not found", name);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the server's copy of `node` wholesale with the local state.
    pub fn update(&self, node: &Node) -> Result<Node, ChefError> {
        node.validate()?;
        let local = node.to_json()?;
        info!("Updating node {}", node.name);
        let res = self.client.request(
            Method::Put,
            &node_path(&node.name),
            Some(serde_json::to_string(&local)?),
        )?;
        confirm(local, res.json()?)
    }

    /// Delete `node`, returning the local copy as it was before deletion.
    pub fn delete(&self, node: &Node) -> Result<Node, ChefError> {
        self.delete_by_name(&node.name)?;
        Ok(node.clone())
    }

    /// Delete a node by name, returning the node as the server last held it.
    pub fn delete_by_name(&self, name: &str) -> Result<Node, ChefError> {
        check_name(name)?;
        info!("Deleting node {}", name);
        let res = self.client.request(Method::Delete, &node_path(name), None)?;
        confirm(Node::new(name)?.to_json()?, res.json()?)
    }

    /// Delete every node. Every node is attempted; failures are collected and
    /// returned together as `ChefError::Aggregate`. Nodes already gone count
    /// as deleted.
    pub fn delete_all(&self) -> Result<Vec<Node>, ChefError> {
        let names = self.list()?;
        let mut deleted = Vec::with_capacity(names.len());
        let mut failures = DeleteFailures::default();

        for name in names {
            match self.delete_by_name(&name) {
                Ok(node) => deleted.push(node),
                Err(ref e) if e.is_not_found() => {
                    debug!("Node {} already deleted", name);
                }
                Err(e) => {
                    warn!("Failed to delete node {}: {}", name, e);
                    failures.push(name, e);
                }
            }
        }

        if failures.is_empty() {
            Ok(deleted)
        } else {
            Err(ChefError::Aggregate(failures))
        }
    }

    /// Every node in the organization, fully fetched. Order is whatever the
    /// server returns.
    pub fn all(&self) -> Result<Vec<Node>, ChefError> {
        let names = self.list()?;
        let mut nodes = Vec::with_capacity(names.len());
        for name in names {
            match self.find(&name)? {
                Some(node) => nodes.push(node),
                None => debug!("Node {} vanished while listing", name),
            }
        }
        Ok(nodes)
    }

    /// Names of every node in the organization.
    pub fn list(&self) -> Result<NodeList, ChefError> {
        let res = self.client.request(Method::Get, NODES, None)?;
        NodeList::try_from(res.json()?)
    }

    /// Fetch a node, merge the given run list entries and normal attributes
    /// into it, and save it.
    pub fn merge_data(
        &self,
        name: &str,
        run_list: &[String],
        attrs: &HashMap<String, Value>,
    ) -> Result<Node, ChefError> {
        let mut node = self
            .find(name)?
            .ok_or_else(|| ChefError::NotFound(node_path(name)))?;
        node.merge_data(run_list, attrs)?;
        self.update(&node)
    }
}

fn node_path(name: &str) -> String {
    format!("{}/{}", NODES, name)
}

fn check_name(name: &str) -> Result<(), ChefError> {
    Node::new(name).map(|_| ())
}

/// Overlay the server's response document on the document we sent and decode
/// the result. Servers that echo only a `uri` leave the local state intact.
fn confirm(local: Value, response: Value) -> Result<Node, ChefError> {
    let mut doc = local;
    if let (Value::Object(fields), Value::Object(response)) = (&mut doc, response) {
        for (k, v) in response {
            fields.insert(k, v);
        }
    }
    Node::try_from(doc)
}
