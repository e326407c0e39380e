//! Token module for JWT sessions
//!
//! This module handles:
//! - Signing and verifying access and refresh tokens with separate secrets
//! - Background reaping of stale refresh ledger rows

mod cleanup;
mod codec;
mod config;

#[cfg(test)]
mod tests;

pub use cleanup::{LedgerReaper, LedgerReaperConfig, ReapResult};
pub use codec::TokenCodec;
pub use config::TokenCodecConfig;
