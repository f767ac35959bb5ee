//! Fetch-then-deliver orchestration.
//!
//! A [`Pipeline`] validates a [`Job`], downloads the video through a
//! [`Fetcher`], and hands the stored file to a [`Dispatcher`]. Every run ends
//! in exactly one [`Outcome`]; a failed step short-circuits the rest.

pub mod outcome;

use std::sync::Arc;

use {
    clipcast_common::{DeliveryRequest, RecipientId},
    clipcast_config::{ClipcastConfig, ConfigError, GatewayCredentials},
    tokio::sync::Mutex,
    tracing::{info, warn},
};

pub use {
    clipcast_media::Fetcher,
    clipcast_whatsapp::Dispatcher,
    outcome::{Job, Outcome},
};

use {clipcast_media::YtDlpFetcher, clipcast_whatsapp::GreenApiDispatcher};

/// Runs one job at a time from input validation to delivery.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    dispatcher: Arc<dyn Dispatcher>,
    // Held for a whole run so submissions never overlap.
    running: Mutex<()>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn Fetcher>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            fetcher,
            dispatcher,
            running: Mutex::new(()),
        }
    }

    /// Wire the `yt-dlp` fetcher and Green API dispatcher from config.
    ///
    /// Fails when gateway credentials are incomplete, before any job runs.
    pub fn from_config(config: &ClipcastConfig) -> Result<Self, ConfigError> {
        let credentials = GatewayCredentials::from_config(config)?;
        let fetcher = YtDlpFetcher::from_config(&config.fetch, &config.storage);
        let dispatcher = GreenApiDispatcher::new(&credentials);
        Ok(Self::new(Arc::new(fetcher), Arc::new(dispatcher)))
    }

    pub async fn run(&self, job: Job) -> Outcome {
        let _running = self.running.lock().await;

        let recipient = match RecipientId::parse(&job.recipient) {
            Ok(recipient) => recipient,
            Err(e) => return Outcome::InvalidInput(e.to_string()),
        };
        if let Err(e) = clipcast_media::validate_source_url(&job.source_url) {
            return Outcome::InvalidInput(e.to_string());
        }

        info!(url = %job.source_url.trim(), recipient = %recipient, "starting job");

        let file = match self.fetcher.fetch(&job.source_url).await {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "job stopped: download failed");
                return Outcome::FetchFailed(e.to_string());
            },
        };

        let request = DeliveryRequest::new(recipient, file.clone(), job.caption);
        let result = self.dispatcher.deliver(request).await;
        if result.succeeded {
            info!(path = %file.path.display(), "job finished");
            Outcome::Delivered { file, result }
        } else {
            warn!(path = %file.path.display(), "job stopped: delivery failed");
            Outcome::DeliveryFailed { file, result }
        }
    }
}
