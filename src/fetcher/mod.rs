//! Fetcher module for capturing a page and its resources
//!
//! This module contains the capture pipeline, including:
//! - Resource discovery and reference rewriting
//! - HTML serialization with the rewritten references
//! - Concurrent asset downloads
//! - Aggregation of partial failures

mod aggregate;
mod coordinator;
mod rewrite;
mod serializer;

pub use aggregate::AggregateError;
pub use coordinator::{FetchMetadata, Fetcher};
pub use rewrite::{
    reference_path, rewrite_document, AssetDownload, ResourceReference, RewrittenDocument,
};
