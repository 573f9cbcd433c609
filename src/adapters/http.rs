// src/adapters/http.rs
//! HTTP plumbing shared by the store adapters: per-store header/cookie profiles,
//! per-call clients and link resolution.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE, REFERER};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Site-specific request decoration. Passed through to the wire unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpProfile {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default)]
    pub accept: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

impl Default for HttpProfile {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            referer: None,
            accept: None,
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
        }
    }
}

impl HttpProfile {
    /// Headers this profile adds to every request.
    pub fn header_map(&self) -> Result<HeaderMap, AdapterError> {
        let mut map = HeaderMap::new();
        if let Some(r) = &self.referer {
            map.insert(REFERER, header_value(r)?);
        }
        if let Some(a) = &self.accept {
            map.insert(ACCEPT, header_value(a)?);
        }
        for (k, v) in &self.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|e| AdapterError::Config(format!("header name {k:?}: {e}")))?;
            map.insert(name, header_value(v)?);
        }
        if !self.cookies.is_empty() {
            let jar = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            map.insert(COOKIE, header_value(&jar)?);
        }
        Ok(map)
    }

    /// Build a client for a single call. Dropping it releases its connections.
    pub fn client(&self) -> Result<Client, AdapterError> {
        let client = Client::builder()
            .user_agent(self.user_agent.as_str())
            .default_headers(self.header_map()?)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(client)
    }
}

fn header_value(v: &str) -> Result<HeaderValue, AdapterError> {
    HeaderValue::from_str(v).map_err(|e| AdapterError::Config(format!("header value {v:?}: {e}")))
}

/// A live search endpoint: `GET endpoint?{query_param}={query}&{params...}`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    pub endpoint: String,
    pub query_param: String,
    pub params: Vec<(String, String)>,
    pub profile: HttpProfile,
}

impl HttpSource {
    pub async fn get_text(&self, query: &str) -> Result<String, AdapterError> {
        let client = self.profile.client()?;
        let resp = client
            .get(&self.endpoint)
            .query(&[(self.query_param.as_str(), query)])
            .query(&self.params)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AdapterError::Status(status.as_u16()));
        }
        Ok(resp.text().await?)
    }
}

/// Where an adapter's response body comes from.
#[derive(Debug, Clone)]
pub enum Transport {
    /// Canned body, used by tests and the offline demo.
    Fixture(String),
    Http(HttpSource),
}

impl Transport {
    pub async fn body(&self, query: &str) -> Result<String, AdapterError> {
        match self {
            Transport::Fixture(s) => Ok(s.clone()),
            Transport::Http(src) => src.get_text(query).await,
        }
    }
}

/// Make a product link absolute against the store's base URL when possible.
pub fn resolve_link(base: Option<&str>, link: &str) -> String {
    let link = link.trim();
    if Url::parse(link).is_ok() {
        return link.to_string();
    }
    base.and_then(|b| Url::parse(b).ok())
        .and_then(|b| b.join(link).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| link.to_string())
}
