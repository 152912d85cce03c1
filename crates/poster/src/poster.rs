use std::{sync::Arc, time::Duration};

use {
    botplus_config::PosterConfig,
    reqwest::{Url, header::AUTHORIZATION},
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
    tokio::{task::JoinHandle, time::MissedTickBehavior},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{Error, Result};

pub const USER_AGENT: &str = concat!("botplus/", env!("CARGO_PKG_VERSION"));

/// Where the reported server count comes from.
pub trait StatsSource: Send + Sync {
    fn server_count(&self) -> u64;
}

impl<F> StatsSource for F
where
    F: Fn() -> u64 + Send + Sync,
{
    fn server_count(&self) -> u64 {
        self()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsPayload {
    pub server_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_id: Option<u32>,
}

pub struct StatsPoster {
    client: reqwest::Client,
    endpoint: Url,
    token: Secret<String>,
    interval: Duration,
    shard_count: Option<u32>,
    shard_id: Option<u32>,
    source: Arc<dyn StatsSource>,
}

impl StatsPoster {
    pub fn new(config: &PosterConfig, source: Arc<dyn StatsSource>) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.expose_secret().is_empty())
            .ok_or(Error::MissingToken)?;
        let endpoint = Url::parse(&config.endpoint).map_err(|_| Error::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
        })?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            token,
            interval: Duration::from_secs(config.interval_secs.max(1)),
            shard_count: config.shard_count,
            shard_id: config.shard_id,
            source,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn payload(&self) -> StatsPayload {
        StatsPayload {
            server_count: self.source.server_count(),
            shard_count: self.shard_count,
            shard_id: self.shard_id,
        }
    }

    /// Send one stats update.
    pub async fn post_once(&self) -> Result<()> {
        let payload = self.payload();
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, self.token.expose_secret().as_str())
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }
        debug!(server_count = payload.server_count, "stats posted");
        Ok(())
    }

    /// Post immediately, then every interval until stopped. Failed posts are
    /// logged and retried on the next tick.
    pub fn start(self: Arc<Self>) -> PosterHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                endpoint = %self.endpoint,
                interval_secs = self.interval.as_secs(),
                "stats poster started"
            );
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.post_once().await {
                            warn!(error = %e, "failed to post stats");
                        }
                    },
                }
            }
            info!("stats poster stopped");
        });
        PosterHandle { cancel, task }
    }
}

/// Running poster loop.
pub struct PosterHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PosterHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}
