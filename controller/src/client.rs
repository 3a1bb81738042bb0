//! # Controller Client
//!
//! A cookie-session client for the UniFi Network API.
//!
//! Two controller flavours are supported:
//! * **UniFi OS** consoles log in at `/api/auth/login` and serve the network
//!   API under `/proxy/network`.
//! * **Classic** controllers log in at `/api/login` and serve it at the root.
//!
//! The flavour is detected on every login, which happens at the start of each
//! inventory fetch.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use hostsync_common::config::UnifiConfig;
use hostsync_common::network::inventory::{Devices, Observation, Site};
use hostsync_core::inventory::Inventory;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::ControllerError;
use crate::models::{ClientRecord, DeviceRecord, Envelope, SiteRecord, split_devices};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    UnifiOs,
    Classic,
}

impl Flavor {
    fn api_prefix(self) -> &'static str {
        match self {
            Flavor::UnifiOs => "/proxy/network",
            Flavor::Classic => "",
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

pub struct UnifiClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
    flavor: Mutex<Flavor>,
}

impl UnifiClient {
    pub fn new(config: &UnifiConfig) -> Result<Self, ControllerError> {
        let base_url: String = normalize_host(&config.host).ok_or(ControllerError::MissingHost)?;

        let client: Client = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(ControllerError::Client)?;

        Ok(Self {
            client,
            base_url,
            user: config.user.clone(),
            password: config.password.clone(),
            flavor: Mutex::new(Flavor::UnifiOs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn flavor(&self) -> Flavor {
        self.flavor
            .lock()
            .map(|flavor| *flavor)
            .unwrap_or(Flavor::UnifiOs)
    }

    fn set_flavor(&self, flavor: Flavor) {
        if let Ok(mut current) = self.flavor.lock() {
            *current = flavor;
        }
    }

    /// Full URL of a network API path for the current flavour.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.flavor().api_prefix(), path)
    }

    /// Logs in and records which controller flavour answered.
    pub async fn login(&self) -> Result<Flavor, ControllerError> {
        let credentials = Credentials {
            username: &self.user,
            password: &self.password,
        };

        let mut last_status: StatusCode = StatusCode::UNAUTHORIZED;
        for (flavor, path) in [
            (Flavor::UnifiOs, "/api/auth/login"),
            (Flavor::Classic, "/api/login"),
        ] {
            let url: String = format!("{}{}", self.base_url, path);
            let response = self
                .client
                .post(&url)
                .json(&credentials)
                .send()
                .await
                .map_err(|source| ControllerError::Request {
                    url: url.clone(),
                    source,
                })?;

            let status: StatusCode = response.status();
            if status.is_success() {
                debug!(?flavor, "logged in to controller");
                self.set_flavor(flavor);
                return Ok(flavor);
            }
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ControllerError::Login {
                    host: self.base_url.clone(),
                    status: status.as_u16(),
                });
            }
            last_status = status;
        }

        Err(ControllerError::Login {
            host: self.base_url.clone(),
            status: last_status.as_u16(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ControllerError> {
        let url: String = self.api_url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ControllerError::Request {
                url: url.clone(),
                source,
            })?;

        let status: StatusCode = response.status();
        if !status.is_success() {
            return Err(ControllerError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ControllerError::Request {
                url: url.clone(),
                source,
            })?;
        decode(&url, &body)
    }

    pub async fn list_sites(&self) -> Result<Vec<Site>, ControllerError> {
        self.login().await?;
        let sites: Vec<SiteRecord> = self.get("/api/self/sites").await?;
        Ok(sites.into_iter().map(Site::from).collect())
    }

    pub async fn list_clients(&self, sites: &[Site]) -> Result<Vec<Observation>, ControllerError> {
        let mut clients: Vec<Observation> = Vec::new();
        for site in sites {
            let records: Vec<ClientRecord> =
                self.get(&format!("/api/s/{}/stat/sta", site.name)).await?;
            debug!(site = %site.name, count = records.len(), "fetched clients");
            clients.extend(records.into_iter().map(Observation::from));
        }
        Ok(clients)
    }

    pub async fn list_devices(&self, sites: &[Site]) -> Result<Devices, ControllerError> {
        let mut records: Vec<DeviceRecord> = Vec::new();
        for site in sites {
            let batch: Vec<DeviceRecord> =
                self.get(&format!("/api/s/{}/stat/device", site.name)).await?;
            debug!(site = %site.name, count = batch.len(), "fetched devices");
            records.extend(batch);
        }
        Ok(split_devices(records))
    }
}

#[async_trait]
impl Inventory for UnifiClient {
    async fn sites(&self) -> anyhow::Result<Vec<Site>> {
        let sites: Vec<Site> = self.list_sites().await?;
        info!("{} UniFi sites found", sites.len());
        Ok(sites)
    }

    async fn clients(&self, sites: &[Site]) -> anyhow::Result<Vec<Observation>> {
        Ok(self.list_clients(sites).await?)
    }

    async fn devices(&self, sites: &[Site]) -> anyhow::Result<Devices> {
        Ok(self.list_devices(sites).await?)
    }
}

/// Adds a scheme when missing and strips trailing slashes.
fn normalize_host(host: &str) -> Option<String> {
    let host: &str = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return None;
    }
    if host.starts_with("http://") || host.starts_with("https://") {
        Some(host.to_string())
    } else {
        Some(format!("https://{host}"))
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<Vec<T>, ControllerError> {
    let envelope: Envelope<T> =
        serde_json::from_slice(body).map_err(|source| ControllerError::Decode {
            url: url.to_string(),
            source,
        })?;

    if !envelope.meta.is_ok() {
        return Err(ControllerError::Api {
            url: url.to_string(),
            message: envelope
                .meta
                .msg
                .unwrap_or_else(|| envelope.meta.rc.clone()),
        });
    }
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str) -> UnifiConfig {
        UnifiConfig {
            host: host.into(),
            user: "admin".into(),
            password: "secret".into(),
            verify_tls: true,
        }
    }

    #[test]
    fn host_gets_scheme_and_loses_trailing_slash() {
        assert_eq!(normalize_host("unifi.lan"), Some("https://unifi.lan".into()));
        assert_eq!(
            normalize_host(" http://10.0.0.1:8443/ "),
            Some("http://10.0.0.1:8443".into())
        );
        assert_eq!(normalize_host("  "), None);
    }

    #[test]
    fn missing_host_is_rejected() {
        assert!(matches!(
            UnifiClient::new(&config("")),
            Err(ControllerError::MissingHost)
        ));
    }

    #[test]
    fn api_urls_follow_the_detected_flavor() {
        let client = UnifiClient::new(&config("https://unifi.lan")).unwrap();
        assert_eq!(
            client.api_url("/api/self/sites"),
            "https://unifi.lan/proxy/network/api/self/sites"
        );

        client.set_flavor(Flavor::Classic);
        assert_eq!(
            client.api_url("/api/s/default/stat/sta"),
            "https://unifi.lan/api/s/default/stat/sta"
        );
    }

    #[test]
    fn decode_surfaces_controller_errors() {
        let body = br#"{"meta": {"rc": "error", "msg": "api.err.LoginRequired"}, "data": []}"#;

        let err = decode::<SiteRecord>("https://unifi.lan/api/self/sites", body).unwrap_err();

        assert_eq!(
            err.to_string(),
            "controller reported an error for https://unifi.lan/api/self/sites: api.err.LoginRequired"
        );
    }

    #[test]
    fn decode_rejects_malformed_bodies() {
        let err = decode::<SiteRecord>("u", b"<html>").unwrap_err();
        assert!(matches!(err, ControllerError::Decode { .. }));
    }

    #[tokio::test]
    async fn unreachable_controller_fails_the_sites_stage() {
        let client = UnifiClient::new(&config("http://127.0.0.1:9")).unwrap();

        let err = client.sites().await.unwrap_err();

        assert!(err.downcast_ref::<ControllerError>().is_some());
    }
}
