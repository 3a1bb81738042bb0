use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("controller host is not configured")]
    MissingHost,
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("login to {host} rejected (HTTP {status})")]
    Login { host: String, status: u16 },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("controller reported an error for {url}: {message}")]
    Api { url: String, message: String },
    #[error("unable to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
