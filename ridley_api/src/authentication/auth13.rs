use crate::errors::ChefError;
use crate::utils::{expand_string, squeeze_path};
use base64::{engine::general_purpose, Engine as _};
use chrono::*;
use itertools::Itertools;
use openssl::hash::{hash, MessageDigest};
use openssl::pkey::PKey;
use openssl::sign::Signer;
use std::fmt;

const AUTHORIZATION_CHUNK: usize = 60;

/// Version 1.3 of the Chef Server header signing protocol.
pub struct Auth13 {
    api_version: String,
    body: Option<String>,
    date: String,
    key: Vec<u8>,
    method: String,
    path: String,
    userid: String,
}

impl fmt::Debug for Auth13 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Auth13")
            .field("method", &self.method)
            .field("userid", &self.userid)
            .field("path", &self.path)
            .field("date", &self.date)
            .finish()
    }
}

impl Auth13 {
    pub fn new(
        path: &str,
        key: &[u8],
        method: &str,
        userid: &str,
        api_version: &str,
        body: Option<String>,
    ) -> Auth13 {
        Auth13 {
            api_version: api_version.into(),
            body,
            date: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            key: key.into(),
            method: method.to_ascii_uppercase(),
            path: squeeze_path(path),
            userid: userid.into(),
        }
    }

    fn content_hash(&self) -> Result<String, ChefError> {
        let body = expand_string(&self.body);
        let content = hash(MessageDigest::sha256(), body.as_bytes())?;
        let content = general_purpose::STANDARD.encode(content);
        debug!("Content hash is: {:?}", content);
        Ok(content)
    }

    fn canonical_request(&self) -> Result<String, ChefError> {
        let cr = format!(
            "Method:{}\nPath:{}\nX-Ops-Content-Hash:{}\n\
             X-Ops-Sign:version=1.3\nX-Ops-Timestamp:{}\n\
             X-Ops-UserId:{}\nX-Ops-Server-API-Version:{}",
            &self.method,
            &self.path,
            self.content_hash()?,
            self.date,
            &self.userid,
            &self.api_version
        );
        debug!("Canonical Request is: {:?}", cr);
        Ok(cr)
    }

    fn signed_request(&self) -> Result<String, ChefError> {
        let key = PKey::private_key_from_pem(self.key.as_slice())?;

        let mut signer = Signer::new(MessageDigest::sha256(), &key)?;
        signer.update(self.canonical_request()?.as_bytes())?;
        Ok(general_purpose::STANDARD.encode(signer.sign_to_vec()?))
    }

    /// The authentication headers for this request, in the order the server
    /// documents them.
    pub fn headers(&self) -> Result<Vec<(String, String)>, ChefError> {
        let mut headers = vec![
            ("X-Ops-Content-Hash".to_owned(), self.content_hash()?),
            (
                "X-Ops-Sign".to_owned(),
                "algorithm=sha256;version=1.3".to_owned(),
            ),
            ("X-Ops-Timestamp".to_owned(), self.date.clone()),
            ("X-Ops-Userid".to_owned(), self.userid.clone()),
        ];

        let enc = self.signed_request()?;
        for (i, chunk) in enc.chars().chunks(AUTHORIZATION_CHUNK).into_iter().enumerate() {
            headers.push((
                format!("X-Ops-Authorization-{}", i + 1),
                chunk.collect::<String>(),
            ));
        }
        Ok(headers)
    }
}
