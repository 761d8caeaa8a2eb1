//! Image search relay module
//!
//! Talks to the external image-search provider and normalizes its loosely
//! structured records into the fixed response schema.

mod client;
mod types;

pub use client::{SearchClient, SearchError};
pub use types::{RawImageResult, SearchRequest, SearchResponse, SearchResult};
