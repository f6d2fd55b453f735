// src/hawk.rs
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use url::Url;

const HAWK_HEADER_PREFIX: &str = "hawk.1.header";
const HAWK_PAYLOAD_PREFIX: &str = "hawk.1.payload";
const NONCE_LEN: usize = 6;

#[derive(Error, Debug)]
pub enum HawkError {
    #[error("Request URL has no host: {0}")]
    MissingHost(String),

    #[error("Request URL has no known port: {0}")]
    MissingPort(String),

    #[error("Invalid Hawk key: {0}")]
    InvalidKey(String),

    #[error("System time error: {0}")]
    TimeError(String),
}

/// Hawk id/key pair. For Absence.io the id doubles as the user id.
#[derive(Clone)]
pub struct HawkCredentials {
    pub id: String,
    pub key: String,
}

// Keeps the key out of logs
impl fmt::Debug for HawkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HawkCredentials")
            .field("id", &self.id)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Everything that goes into one request's MAC.
#[derive(Debug, Clone)]
pub struct HawkArtifacts {
    pub ts: u64,
    pub nonce: String,
    pub method: String,
    pub resource: String,
    pub host: String,
    pub port: u16,
    pub hash: Option<String>,
    pub ext: Option<String>,
}

impl HawkArtifacts {
    /// Builds artifacts for `url` with a fresh timestamp and nonce.
    /// The payload hash is always included, matching what Absence.io expects.
    pub fn for_request(
        method: &str,
        url: &Url,
        content_type: &str,
        body: &[u8],
    ) -> Result<Self, HawkError> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| HawkError::TimeError(e.to_string()))?
            .as_secs();
        let nonce: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        Self::with_clock(method, url, content_type, body, ts, nonce)
    }

    pub fn with_clock(
        method: &str,
        url: &Url,
        content_type: &str,
        body: &[u8],
        ts: u64,
        nonce: String,
    ) -> Result<Self, HawkError> {
        let host = url
            .host_str()
            .ok_or_else(|| HawkError::MissingHost(url.to_string()))?
            .to_ascii_lowercase();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| HawkError::MissingPort(url.to_string()))?;
        let mut resource = url.path().to_string();
        if let Some(query) = url.query() {
            resource.push('?');
            resource.push_str(query);
        }

        Ok(Self {
            ts,
            nonce,
            method: method.to_ascii_uppercase(),
            resource,
            host,
            port,
            hash: Some(payload_hash(content_type, body)),
            ext: None,
        })
    }

    pub fn normalized_string(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
            HAWK_HEADER_PREFIX,
            self.ts,
            self.nonce,
            self.method,
            self.resource,
            self.host,
            self.port,
            self.hash.as_deref().unwrap_or(""),
            self.ext.as_deref().unwrap_or(""),
        )
    }

    pub fn mac(&self, credentials: &HawkCredentials) -> Result<String, HawkError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(credentials.key.as_bytes())
            .map_err(|e| HawkError::InvalidKey(e.to_string()))?;
        mac.update(self.normalized_string().as_bytes());
        Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Value for the `Authorization` header.
    pub fn header(&self, credentials: &HawkCredentials) -> Result<String, HawkError> {
        let mac = self.mac(credentials)?;
        let mut header = format!(
            "Hawk id=\"{}\", ts=\"{}\", nonce=\"{}\"",
            credentials.id, self.ts, self.nonce
        );
        if let Some(hash) = &self.hash {
            header.push_str(&format!(", hash=\"{}\"", hash));
        }
        if let Some(ext) = &self.ext {
            header.push_str(&format!(", ext=\"{}\"", ext));
        }
        header.push_str(&format!(", mac=\"{}\"", mac));
        Ok(header)
    }
}

/// Hash of the request body. Only the mime type is used, parameters such as
/// `charset` are dropped.
pub fn payload_hash(content_type: &str, body: &[u8]) -> String {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(HAWK_PAYLOAD_PREFIX.as_bytes());
    hasher.update(b"\n");
    hasher.update(mime.as_bytes());
    hasher.update(b"\n");
    hasher.update(body);
    hasher.update(b"\n");
    BASE64_STANDARD.encode(hasher.finalize())
}
