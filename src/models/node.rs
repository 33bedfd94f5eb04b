model_use!();

use crate::models::attributes::{self, Precedence};

chef_json_type!(NodeJsonClass, "Chef::Node");
chef_json_type!(NodeChefType, "node");

pub const DEFAULT_ENVIRONMENT: &str = "_default";

/// A node as stored on the Chef Server.
///
/// Equality compares the name, environment, run list and all four attribute
/// layers by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub name: String,
    chef_type: NodeChefType,
    json_class: NodeJsonClass,
    pub chef_environment: String,
    pub run_list: Vec<String>,
    pub normal: HashMap<String, Value>,
    pub automatic: HashMap<String, Value>,
    pub default: HashMap<String, Value>,
    #[serde(rename = "override")]
    pub overrides: HashMap<String, Value>,
}

impl Default for Node {
    fn default() -> Node {
        Node {
            name: String::new(),
            chef_type: NodeChefType,
            json_class: NodeJsonClass,
            chef_environment: DEFAULT_ENVIRONMENT.into(),
            run_list: Vec::new(),
            normal: HashMap::new(),
            automatic: HashMap::new(),
            default: HashMap::new(),
            overrides: HashMap::new(),
        }
    }
}

model_impl!(Node);
model_list!(NodeList);

fn valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' || c == ':'
}

impl Node {
    pub fn new(name: &str) -> Result<Node, ChefError> {
        let node = Node {
            name: name.into(),
            ..Default::default()
        };
        node.validate()?;
        Ok(node)
    }

    /// Check the node can be sent to the server.
    pub fn validate(&self) -> Result<(), ChefError> {
        if self.name.is_empty() {
            return Err(ChefError::Validation("node name must not be empty".into()));
        }
        if !self.name.chars().all(valid_name_char) {
            return Err(ChefError::Validation(format!(
                "node name '{}' contains invalid characters",
                self.name
            )));
        }
        if self.chef_environment.is_empty() {
            return Err(ChefError::Validation(format!(
                "node '{}' has an empty chef_environment",
                self.name
            )));
        }
        if self.run_list.iter().any(|item| item.trim().is_empty()) {
            return Err(ChefError::Validation(format!(
                "node '{}' has an empty run_list entry",
                self.name
            )));
        }
        Ok(())
    }

    pub fn layer(&self, precedence: Precedence) -> &HashMap<String, Value> {
        match precedence {
            Precedence::Automatic => &self.automatic,
            Precedence::Default => &self.default,
            Precedence::Normal => &self.normal,
            Precedence::Override => &self.overrides,
        }
    }

    fn layer_mut(&mut self, precedence: Precedence) -> &mut HashMap<String, Value> {
        match precedence {
            Precedence::Automatic => &mut self.automatic,
            Precedence::Default => &mut self.default,
            Precedence::Normal => &mut self.normal,
            Precedence::Override => &mut self.overrides,
        }
    }

    /// Replace one whole layer.
    pub fn set_layer(&mut self, precedence: Precedence, attrs: HashMap<String, Value>) {
        *self.layer_mut(precedence) = attrs;
    }

    pub fn set_normal(&mut self, attrs: HashMap<String, Value>) {
        self.set_layer(Precedence::Normal, attrs)
    }

    pub fn set_default(&mut self, attrs: HashMap<String, Value>) {
        self.set_layer(Precedence::Default, attrs)
    }

    pub fn set_override(&mut self, attrs: HashMap<String, Value>) {
        self.set_layer(Precedence::Override, attrs)
    }

    pub fn set_automatic(&mut self, attrs: HashMap<String, Value>) {
        self.set_layer(Precedence::Automatic, attrs)
    }

    /// Set a single attribute in one layer by dotted path, e.g.
    /// `set_attribute(Precedence::Normal, "nginx.worker_processes", json!(4))`.
    pub fn set_attribute(
        &mut self,
        precedence: Precedence,
        path: &str,
        value: Value,
    ) -> Result<(), ChefError> {
        attributes::set_path(self.layer_mut(precedence), path, value)
    }

    pub fn set_normal_attribute(&mut self, path: &str, value: Value) -> Result<(), ChefError> {
        self.set_attribute(Precedence::Normal, path, value)
    }

    pub fn set_default_attribute(&mut self, path: &str, value: Value) -> Result<(), ChefError> {
        self.set_attribute(Precedence::Default, path, value)
    }

    pub fn set_override_attribute(&mut self, path: &str, value: Value) -> Result<(), ChefError> {
        self.set_attribute(Precedence::Override, path, value)
    }

    /// The effective attributes: override, then normal, then default, then
    /// automatic, merged per key path.
    pub fn merged_attributes(&self) -> HashMap<String, Value> {
        let layers: Vec<&HashMap<String, Value>> = Precedence::ascending()
            .iter()
            .map(|p| self.layer(*p))
            .collect();
        attributes::merge_layers(&layers)
    }

    /// Effective value at a dotted path.
    pub fn attribute(&self, path: &str) -> Option<Value> {
        attributes::lookup(&self.merged_attributes(), path).cloned()
    }

    /// Append any run list entries not already present and deep merge
    /// `attrs` into the normal layer.
    pub fn merge_data(
        &mut self,
        run_list: &[String],
        attrs: &HashMap<String, Value>,
    ) -> Result<(), ChefError> {
        if run_list.iter().any(|item| item.trim().is_empty()) {
            return Err(ChefError::Validation("empty run_list entry".into()));
        }
        for item in run_list {
            if !self.run_list.contains(item) {
                self.run_list.push(item.clone());
            }
        }
        attributes::merge_into(&mut self.normal, attrs);
        Ok(())
    }

    pub fn cloud(&self) -> bool {
        match self.automatic.get("cloud") {
            None | Some(Value::Null) => false,
            Some(_) => true,
        }
    }

    pub fn cloud_provider(&self) -> Option<&str> {
        self.automatic_str("cloud.provider")
    }

    pub fn public_hostname(&self) -> Option<&str> {
        if self.cloud() {
            self.automatic_str("cloud.public_hostname")
        } else {
            self.automatic_str("fqdn")
        }
    }

    pub fn public_ipv4(&self) -> Option<&str> {
        if self.cloud() {
            self.automatic_str("cloud.public_ipv4")
        } else {
            self.automatic_str("ipaddress")
        }
    }

    fn automatic_str(&self, path: &str) -> Option<&str> {
        attributes::lookup(&self.automatic, path).and_then(Value::as_str)
    }
}
