//! Shared types, error definitions, and utilities used across all clipcast crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, Result},
    types::{DeliveryRequest, DeliveryResult, MediaFile, RecipientId},
};
