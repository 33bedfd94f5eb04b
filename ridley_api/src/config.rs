use crate::errors::ChefError;
use openssl::pkey::PKey;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

fn default_api_version() -> String {
    "1".into()
}

/// Everything needed to reach and authenticate against one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub client_name: String,
    /// Path to a PEM encoded private key, or the PEM text itself.
    #[serde(default)]
    pub client_key: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Config {
    pub fn new(server_url: &str, client_name: &str, client_key: &str, organization: &str) -> Config {
        Config {
            server_url: server_url.into(),
            client_name: client_name.into(),
            client_key: client_key.into(),
            organization: organization.into(),
            api_version: default_api_version(),
        }
    }

    /// Check that all required fields are present and the server URL parses.
    pub fn validate(&self) -> Result<Url, ChefError> {
        let missing: Vec<&str> = [
            ("server_url", &self.server_url),
            ("client_name", &self.client_name),
            ("client_key", &self.client_key),
            ("organization", &self.organization),
        ]
        .iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| *k)
        .collect();
        if !missing.is_empty() {
            return Err(ChefError::Configuration(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        let url = Url::parse(&self.server_url).map_err(|e| {
            ChefError::Configuration(format!("invalid server_url {}: {}", self.server_url, e))
        })?;
        if url.host_str().is_none() {
            return Err(ChefError::Configuration(format!(
                "server_url {} has no host",
                self.server_url
            )));
        }
        Ok(url)
    }

    /// Read the private key, failing if it can't be read or isn't a valid
    /// PEM private key.
    pub fn load_key(&self) -> Result<Vec<u8>, ChefError> {
        let key = if self.client_key.trim_start().starts_with("-----BEGIN") {
            self.client_key.clone().into_bytes()
        } else {
            fs::read(&self.client_key).map_err(|e| {
                ChefError::Configuration(format!("unable to read key {}: {}", self.client_key, e))
            })?
        };
        PKey::private_key_from_pem(&key).map_err(|e| {
            ChefError::Configuration(format!("invalid private key {}: {}", self.client_key, e))
        })?;
        Ok(key)
    }

    /// Load a profile from the knife style credentials file, found at
    /// `$CHEF_CREDENTIALS` or `~/.chef/credentials`. The profile defaults to
    /// `$CHEF_PROFILE`, then `default`.
    pub fn from_credentials(profile: Option<&str>) -> Result<Config, ChefError> {
        let path = credentials_path()?;
        let profile = profile
            .map(String::from)
            .or_else(|| env::var("CHEF_PROFILE").ok())
            .unwrap_or_else(|| "default".into());
        Config::from_credentials_file(&path, &profile)
    }

    pub fn from_credentials_file(path: &Path, profile: &str) -> Result<Config, ChefError> {
        let text = fs::read_to_string(path).map_err(|e| {
            ChefError::Configuration(format!("unable to read {}: {}", path.display(), e))
        })?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        Config::parse_credentials(&text, profile, dir)
    }

    fn parse_credentials(text: &str, profile: &str, dir: &Path) -> Result<Config, ChefError> {
        let creds: toml::Value = text
            .parse()
            .map_err(|e: toml::de::Error| ChefError::Configuration(e.to_string()))?;
        let section = creds
            .get(profile)
            .and_then(|v| v.as_table())
            .ok_or_else(|| ChefError::Configuration(format!("no profile named {}", profile)))?;
        let field = |name: &str| -> String {
            section
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_owned()
        };

        let mut server_url = field("chef_server_url");
        let mut organization = field("organization");
        if let Some(idx) = server_url.find("/organizations/") {
            let org = server_url[idx + "/organizations/".len()..]
                .trim_end_matches('/')
                .to_owned();
            if organization.is_empty() {
                organization = org;
            }
            server_url.truncate(idx);
        }

        let mut client_key = field("client_key");
        if !client_key.is_empty()
            && !client_key.trim_start().starts_with("-----BEGIN")
            && Path::new(&client_key).is_relative()
        {
            client_key = dir.join(&client_key).to_string_lossy().into_owned();
        }

        let api_version = match field("api_version") {
            ref v if v.is_empty() => default_api_version(),
            v => v,
        };

        debug!("Loaded credentials profile {}", profile);
        Ok(Config {
            server_url,
            client_name: field("client_name"),
            client_key,
            organization,
            api_version,
        })
    }
}

fn credentials_path() -> Result<PathBuf, ChefError> {
    if let Ok(path) = env::var("CHEF_CREDENTIALS") {
        return Ok(PathBuf::from(path));
    }
    dirs::home_dir()
        .map(|home| home.join(".chef").join("credentials"))
        .ok_or_else(|| ChefError::Configuration("unable to find home directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "fixtures/spec-user.pem";

    #[test]
    fn test_validate_reports_missing_fields() {
        let cfg = Config::new("https://chef.example.com", "", KEY, "");
        match cfg.validate() {
            Err(ChefError::Configuration(msg)) => {
                assert!(msg.contains("client_name"));
                assert!(msg.contains("organization"));
                assert!(!msg.contains("server_url"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let cfg = Config::new("not a url", "spec-user", KEY, "clownco");
        assert!(cfg.validate().is_err());
        let cfg = Config::new("https://chef.example.com", "spec-user", KEY, "clownco");
        assert_eq!(cfg.validate().unwrap().host_str(), Some("chef.example.com"));
    }

    #[test]
    fn test_load_key() {
        let cfg = Config::new("https://chef.example.com", "spec-user", KEY, "clownco");
        assert!(cfg.load_key().is_ok());

        let inline = fs::read_to_string(KEY).unwrap();
        let cfg = Config::new("https://chef.example.com", "spec-user", &inline, "clownco");
        assert!(cfg.load_key().is_ok());

        let cfg = Config::new("https://chef.example.com", "spec-user", "fixtures/nope.pem", "clownco");
        match cfg.load_key() {
            Err(ChefError::Configuration(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        let cfg = Config::new("https://chef.example.com", "spec-user", "Cargo.toml", "clownco");
        match cfg.load_key() {
            Err(ChefError::Configuration(msg)) => assert!(msg.contains("invalid private key")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_credentials() {
        let creds = r#"
[default]
client_name = "spec-user"
client_key = "spec-user.pem"
chef_server_url = "https://chef.example.com/organizations/clownco/"

[other]
client_name = "other"
client_key = "/etc/chef/other.pem"
chef_server_url = "https://chef.example.com"
organization = "acme"
api_version = "0"
"#;
        let cfg = Config::parse_credentials(creds, "default", Path::new("/home/me/.chef")).unwrap();
        assert_eq!(cfg.server_url, "https://chef.example.com");
        assert_eq!(cfg.organization, "clownco");
        assert_eq!(cfg.client_name, "spec-user");
        assert_eq!(cfg.client_key, "/home/me/.chef/spec-user.pem");
        assert_eq!(cfg.api_version, "1");

        let cfg = Config::parse_credentials(creds, "other", Path::new("/home/me/.chef")).unwrap();
        assert_eq!(cfg.organization, "acme");
        assert_eq!(cfg.client_key, "/etc/chef/other.pem");
        assert_eq!(cfg.api_version, "0");

        assert!(Config::parse_credentials(creds, "missing", Path::new(".")).is_err());
    }
}
