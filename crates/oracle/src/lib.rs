//! Text-oracle client abstraction.
//!
//! This crate provides:
//! - The `Oracle` trait and request/response types used by the dupscan
//!   pipeline (free text plus optional fenced code blocks)
//! - Model tiers (`Small` for bulk classification, `Large` for confirmation)
//! - An Anthropic Messages API implementation (`AnthropicOracle`)
//! - Tolerant structured-text parsers for tabular and key/value oracle output

mod anthropic;
mod error;
pub mod parse;
mod provider;

pub use anthropic::AnthropicOracle;
pub use error::OracleError;
pub use provider::{
    extract_fences, Fence, ModelTier, Oracle, OracleRequest, OracleResponse, ResponseKind,
};
