//! # sieve-dedup
//!
//! Exact and near-duplicate removal for text training corpora.
//!
//! Two stages run strictly in sequence over an ordered batch of documents:
//! - Exact: whole-document fingerprints, keep the first of each group
//! - Fuzzy: paragraph MinHash signatures bucketed by LSH bands, keep the
//!   first paragraph of each candidate cluster
//!
//! Both stages partition their input into shards and resolve shards in
//! parallel. Every removal is recorded in an [`AuditTrail`].
//!
//! ```no_run
//! use sieve_dedup::{DedupConfig, Deduplicator, Document};
//!
//! let dedup = Deduplicator::new(DedupConfig::default())?;
//! let docs = vec![
//!     Document::new(1, "Hello world.", "http://a"),
//!     Document::new(2, "Hello world.", "http://b"),
//! ];
//! let output = dedup.run(docs)?;
//! assert_eq!(output.documents.len(), 1);
//! # Ok::<(), sieve_core::SieveError>(())
//! ```

pub mod audit;
pub mod cluster;
pub mod config;
pub mod document;
pub mod exact;
pub mod fuzzy;
pub mod io;
pub mod lsh;
pub mod minhash;
pub mod pipeline;
pub mod reconstruct;
pub mod segment;
pub mod shard;

pub use audit::{AuditEntry, AuditTrail, RemovalReason, RemovedRecord, ShardReport, Stage, StageReport};
pub use config::DedupConfig;
pub use document::{CleanedDocument, DocId, Document, Paragraph, ShardId};
pub use exact::{ExactOutcome, ExactResolver};
pub use fuzzy::{FuzzyResolution, FuzzyResolver};
pub use lsh::LshIndex;
pub use minhash::{MinHashSignature, MinHasher};
pub use pipeline::{DedupOutput, DedupStats, Deduplicator, FuzzyOutcome};
pub use reconstruct::reconstruct;
pub use segment::{segment, Segmentation};
pub use shard::{FuzzySharding, ShardRouter};
pub use sieve_core::{Fingerprint, FingerprintAlgorithm, Result, SieveError};
