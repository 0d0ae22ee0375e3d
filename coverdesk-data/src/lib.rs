//! coverdesk-data library interface
//!
//! Resilient data access for the coverdesk record backend: tolerant response
//! parsing, shape normalization, alias-driven field resolution, multi-strategy
//! fetching and fallback submission.
//!
//! Layering, bottom-up:
//! - `parser` turns raw response text into JSON, salvaging noisy bodies
//! - `shape` turns any accepted JSON shape into a flat record collection
//! - `alias` / `resolver` read canonical fields from heterogeneous records
//! - `fetch` / `submit` drive the network through the `Transport` seam
//! - `repository` composes everything per record type

pub mod alias;
pub mod error;
pub mod fetch;
pub mod parser;
pub mod record_type;
pub mod repository;
pub mod resolver;
pub mod shape;
pub mod submit;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use crate::alias::{AliasTable, CanonicalField};
pub use crate::error::{AttachmentError, DataError, DataResult};
pub use crate::fetch::{FetchAttemptResult, FetchStrategy, FetchStrategyRunner};
pub use crate::parser::{parse, ParseOutcome};
pub use crate::record_type::RecordType;
pub use crate::repository::{RecordDraft, RecordRepository};
pub use crate::shape::{ShapeError, ShapeNormalizer};
pub use crate::submit::{Attachment, SubmissionDescriptor, SubmissionOutcome, SubmissionPipeline};
pub use crate::transport::{HttpTransport, Transport, TransportError};
pub use crate::types::{NormalizedCollection, RawRecord, Session};
