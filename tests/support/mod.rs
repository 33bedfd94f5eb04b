//! An in-memory Chef Server speaking just enough of the nodes endpoint for
//! the resource tests.

#![allow(dead_code)]

use ridley::{ChefError, Connection};
use ridley_api::transport::{Channel, Method, Request, Response, Transport};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ORGANIZATION: &str = "vialstudios";

#[derive(Default)]
struct State {
    nodes: Mutex<BTreeMap<String, Value>>,
    delete_failures: Mutex<HashMap<String, u16>>,
    hidden: Mutex<Vec<String>>,
    requests: Mutex<Vec<Request>>,
    connects: AtomicUsize,
    releases: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MemoryServer {
    state: Arc<State>,
}

impl MemoryServer {
    pub fn connection(&self) -> Connection {
        let _ = env_logger::builder().is_test(true).try_init();
        Connection::with_transport(ORGANIZATION, Arc::new(self.clone()))
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn node_count(&self) -> usize {
        self.state.nodes.lock().unwrap().len()
    }

    /// Store a node directly, bypassing the API.
    pub fn seed(&self, name: &str) {
        self.state
            .nodes
            .lock()
            .unwrap()
            .insert(name.to_owned(), stored(json!({ "name": name })));
    }

    /// Make deletes of `name` answer with `status`.
    pub fn fail_delete(&self, name: &str, status: u16) {
        self.state
            .delete_failures
            .lock()
            .unwrap()
            .insert(name.to_owned(), status);
    }

    /// List `name` in the index but answer 404 when it is fetched.
    pub fn hide(&self, name: &str) {
        self.state.hidden.lock().unwrap().push(name.to_owned());
    }
}

/// Fill in the fields the server defaults.
fn stored(mut doc: Value) -> Value {
    let defaults = json!({
        "chef_type": "node",
        "json_class": "Chef::Node",
        "chef_environment": "_default",
        "run_list": [],
        "normal": {},
        "default": {},
        "override": {},
        "automatic": {},
    });
    if let (Value::Object(doc), Value::Object(defaults)) = (&mut doc, defaults) {
        for (k, v) in defaults {
            doc.entry(k).or_insert(v);
        }
    }
    doc
}

fn respond(status: u16, body: Value) -> Response {
    Response {
        status,
        body: body.to_string(),
    }
}

struct MemoryChannel {
    state: Arc<State>,
}

impl MemoryChannel {
    fn handle(&self, req: &Request) -> Response {
        let prefix = format!("/organizations/{}/nodes", ORGANIZATION);
        let rest = match req.path.strip_prefix(&prefix) {
            Some(rest) => rest.trim_start_matches('/'),
            None => return respond(404, json!({"error": ["not found"]})),
        };
        let mut nodes = self.state.nodes.lock().unwrap();
        let body: Value = req
            .body
            .as_ref()
            .map(|b| serde_json::from_str(b).unwrap())
            .unwrap_or(Value::Null);

        match (req.method, rest) {
            (Method::Get, "") => {
                let index: BTreeMap<&String, String> = nodes
                    .keys()
                    .map(|k| (k, format!("https://chef.example.com{}/{}", prefix, k)))
                    .collect();
                respond(200, json!(index))
            }
            (Method::Post, "") => {
                let name = body["name"].as_str().unwrap_or_default().to_owned();
                if nodes.contains_key(&name) {
                    return respond(409, json!({"error": ["Node already exists"]}));
                }
                nodes.insert(name.clone(), stored(body));
                respond(201, json!({"uri": format!("https://chef.example.com{}/{}", prefix, name)}))
            }
            (Method::Get, name) => {
                if self.state.hidden.lock().unwrap().iter().any(|h| h == name) {
                    return respond(404, json!({"error": ["not found"]}));
                }
                match nodes.get(name) {
                    Some(doc) => respond(200, doc.clone()),
                    None => respond(404, json!({"error": ["not found"]})),
                }
            }
            (Method::Put, name) => {
                if !nodes.contains_key(name) {
                    return respond(404, json!({"error": ["not found"]}));
                }
                let doc = stored(body);
                nodes.insert(name.to_owned(), doc.clone());
                respond(200, doc)
            }
            (Method::Delete, name) => {
                if let Some(status) = self.state.delete_failures.lock().unwrap().get(name) {
                    return respond(*status, json!({"error": ["delete refused"]}));
                }
                match nodes.remove(name) {
                    Some(doc) => respond(200, doc),
                    None => respond(404, json!({"error": ["not found"]})),
                }
            }
            _ => respond(405, json!({"error": ["method not allowed"]})),
        }
    }
}

impl Channel for MemoryChannel {
    fn send(&mut self, request: &Request) -> Result<Response, ChefError> {
        self.state.requests.lock().unwrap().push(request.clone());
        Ok(self.handle(request))
    }
}

impl Drop for MemoryChannel {
    fn drop(&mut self) {
        self.state.releases.fetch_add(1, Ordering::SeqCst);
    }
}

impl Transport for MemoryServer {
    fn connect(&self) -> Result<Box<dyn Channel>, ChefError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryChannel {
            state: Arc::clone(&self.state),
        }))
    }
}
