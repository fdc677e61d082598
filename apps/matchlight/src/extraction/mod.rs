//! Extraction — everything between an annotated document and a typed
//! record: prompt templates, the provider client with its retry loop, the
//! response repair ladder, and the no-credential heuristic path.

pub mod client;
pub mod fallback;
pub mod prompts;
pub mod repair;

pub use client::{DocumentInput, ExtractError, ExtractionClient, ProviderReply, ProviderTransport};
pub use repair::repair;
