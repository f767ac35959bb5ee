//! WhatsApp delivery through the Green API gateway.
//!
//! A [`Dispatcher`] takes a local video file and uploads it to a recipient's
//! chat. Failures are reported in the returned [`DeliveryResult`] rather than
//! as errors, so callers always get a status to show the user.

pub mod error;
pub mod green_api;

use async_trait::async_trait;

pub use {
    clipcast_common::{DeliveryRequest, DeliveryResult},
    error::DeliveryError,
    green_api::GreenApiDispatcher,
};

/// Sends a stored media file to a messaging recipient.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn deliver(&self, request: DeliveryRequest) -> DeliveryResult;
}
