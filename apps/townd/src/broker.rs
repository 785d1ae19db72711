//! Media-token broker implementations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use towncore::{BrokerError, MediaBroker, PlayerId, TownId};
use tracing::info;

use crate::Config;

pub fn from_config(cfg: &Config) -> anyhow::Result<Arc<dyn MediaBroker>> {
    match (&cfg.media_url, &cfg.media_auth) {
        (Some(url), Some(auth)) => Ok(Arc::new(HttpTokenBroker::new(
            url.clone(),
            auth.clone(),
            Duration::from_secs(cfg.media_timeout_s),
        )?)),
        (Some(_), None) => {
            anyhow::bail!("TOWND_MEDIA_AUTH is required when TOWND_MEDIA_URL is set")
        }
        _ => {
            info!("no media endpoint configured; minting tokens locally");
            Ok(Arc::new(StaticTokenBroker))
        }
    }
}

/// Development broker: mints an opaque credential locally so the rest of
/// the stack runs without an external media provider.
pub struct StaticTokenBroker;

#[async_trait]
impl MediaBroker for StaticTokenBroker {
    async fn token_for_town(
        &self,
        town_id: &TownId,
        player_id: &PlayerId,
    ) -> Result<String, BrokerError> {
        let mut nonce = [0u8; 16];
        getrandom::getrandom(&mut nonce).map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(town_id.as_str().as_bytes());
        hasher.update(player_id.as_str().as_bytes());
        hasher.update(nonce);
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }
}

#[derive(Debug, Serialize)]
struct MediaTokenRequest<'a> {
    #[serde(rename = "townID")]
    town_id: &'a str,
    #[serde(rename = "playerID")]
    player_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct MediaTokenResponse {
    token: String,
}

/// Talks to an external token endpoint with bearer auth. The client carries
/// a hard request timeout so joins stay bounded.
pub struct HttpTokenBroker {
    client: reqwest::Client,
    url: String,
    auth_token: String,
}

impl HttpTokenBroker {
    pub fn new(url: String, auth_token: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            auth_token,
        })
    }
}

#[async_trait]
impl MediaBroker for HttpTokenBroker {
    async fn token_for_town(
        &self,
        town_id: &TownId,
        player_id: &PlayerId,
    ) -> Result<String, BrokerError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.auth_token)
            .json(&MediaTokenRequest {
                town_id: town_id.as_str(),
                player_id: player_id.as_str(),
            })
            .send()
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BrokerError::Denied(format!(
                "token endpoint returned http={}",
                status.as_u16()
            )));
        }

        let body: MediaTokenResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        Ok(body.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_broker_mints_distinct_url_safe_tokens() {
        let broker = StaticTokenBroker;
        let town = TownId::random();
        let player = PlayerId::random();

        let a = broker.token_for_town(&town, &player).await.unwrap();
        let b = broker.token_for_town(&town, &player).await.unwrap();
        assert_ne!(a, b);
        assert!(!a.is_empty());
        assert!(a
            .bytes()
            .all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_'));
    }
}
