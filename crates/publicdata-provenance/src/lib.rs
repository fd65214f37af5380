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
//! - Every downloaded data file gets a JSON sidecar named
//!   `<file>.meta.json` recording where it came from, when, how large it
//!   was, and a digest for later verification.
//! - Hashing reads in fixed-size chunks so multi-gigabyte tables never
//!   occupy memory whole.
//! - Extra fields merge into the record last-wins, letting providers attach
//!   their own context without this crate knowing about them.
//! - Verification recomputes with whichever algorithm the record names, so
//!   old sidecars stay checkable after the default changes.

mod error;
mod hash;
mod sidecar;

pub use error::{ProvenanceError, ProvenanceResult};
pub use hash::{HASH_CHUNK_SIZE, HashAlgorithm, hash_file};
pub use sidecar::{
    FileHash, META_SUFFIX, ProvenanceRecord, read_provenance, sidecar_path, verify_file,
    write_provenance,
};
