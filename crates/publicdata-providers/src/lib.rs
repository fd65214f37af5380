#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]
//! # Design
//!
//! - One `Provider` seam, `search` plus `fetch`, dispatched through a
//!   registry keyed by provider name.
//! - StatCan tables arrive as a single ZIP from the WDS bulk endpoint; the
//!   adapter extracts it with entry-path sanitization, reads any table
//!   manifest it shipped, and writes a provenance sidecar per file.
//! - CMHC direct URLs rot, so every fetch re-resolves the landing page and
//!   downloads whatever it currently advertises; a failing asset is recorded
//!   on the result instead of sinking the batch.
//! - Temporary archives are removed on success and failure alike.

mod cmhc;
mod error;
mod model;
mod registry;
mod statcan;

pub use cmhc::CmhcProvider;
pub use error::{ProviderError, ProviderResult};
pub use model::{DatasetRef, DatasetResult, FetchOptions, Language};
pub use registry::{Provider, ProviderRegistry};
pub use statcan::{StatCanProvider, WDS_BASE_URL, format_table_number, normalize_pid};

pub use publicdata_resolve::Asset;
