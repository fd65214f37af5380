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
#![allow(clippy::module_name_repetitions)]
//! # Design
//!
//! - Destinations are pinned under `data/raw` relative to a project root and
//!   validated so a stray `..` in a dataset path can never write elsewhere
//!   on disk. Escapes are hard errors, not redirects.
//! - The curated dataset table carries enough context (PID, frequency,
//!   geography, delivery mechanism) to drive fetches without consulting
//!   external documentation.
//! - The in-memory catalog is a plain register with case-insensitive
//!   substring search over titles and descriptions.

mod catalog;
mod dataset;
mod error;
mod layout;

pub use catalog::{Catalog, CatalogEntry};
pub use dataset::{Dataset, default_datasets};
pub use error::{CatalogError, CatalogResult};
pub use layout::DataLayout;
