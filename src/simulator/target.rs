use async_trait::async_trait;
use std::time::Duration;

use crate::Result;

/// The service under load. Only the response status is observed.
#[async_trait]
pub trait TargetClient: Send + Sync {
    /// Issues one request and returns the HTTP status code. An `Err` means
    /// no response was received.
    async fn probe(&self) -> Result<u16>;

    fn describe(&self) -> String;
}

/// Plain `GET` against a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpTarget {
    client: reqwest::Client,
    url: String,
}

impl HttpTarget {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TargetClient for HttpTarget {
    async fn probe(&self) -> Result<u16> {
        let response = self.client.get(&self.url).send().await?;
        Ok(response.status().as_u16())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
