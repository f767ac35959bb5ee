//! Validated gateway credentials.
//!
//! A `GatewayCredentials` value can only be built when all three required
//! values are present, so anything holding one is ready to upload.

use std::time::Duration;

use {secrecy::Secret, url::Url};

use crate::{
    error::{ConfigError, Result},
    schema::ClipcastConfig,
};

#[derive(Clone)]
pub struct GatewayCredentials {
    /// Base media URL without a trailing slash.
    pub media_url: String,
    pub instance_id: String,
    pub api_token: Secret<String>,
    pub upload_timeout: Duration,
}

impl std::fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("media_url", &self.media_url)
            .field("instance_id", &self.instance_id)
            .field("api_token", &"[REDACTED]")
            .field("upload_timeout", &self.upload_timeout)
            .finish()
    }
}

impl GatewayCredentials {
    /// Extract credentials from config, reporting every missing field at once.
    pub fn from_config(config: &ClipcastConfig) -> Result<Self> {
        use secrecy::ExposeSecret;

        fn present(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }

        let gw = &config.gateway;

        let media_url = present(gw.media_url.as_deref());
        let instance_id = present(gw.instance_id.as_deref());
        let api_token = present(gw.api_token.as_ref().map(|t| t.expose_secret().as_str()));

        let missing: Vec<&'static str> = [
            ("GREEN_MEDIA_URL", media_url.is_none()),
            ("GREEN_INSTANCE_ID", instance_id.is_none()),
            ("GREEN_API_TOKEN", api_token.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(media_url), Some(instance_id), Some(api_token)) =
            (media_url, instance_id, api_token)
        else {
            return Err(ConfigError::MissingCredentials { fields: missing });
        };

        let parsed = Url::parse(media_url).map_err(|e| ConfigError::invalid("GREEN_MEDIA_URL", e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "GREEN_MEDIA_URL",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        if gw.upload_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "gateway.upload_timeout_secs",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            media_url: media_url.trim_end_matches('/').to_string(),
            instance_id: instance_id.to_string(),
            api_token: Secret::new(api_token.to_string()),
            upload_timeout: Duration::from_secs(gw.upload_timeout_secs),
        })
    }
}
