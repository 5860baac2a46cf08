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
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Content repository capability used by the updater runner.
//!
//! Layout: `session.rs` (the `Repository`/`RepositorySession` traits), `model.rs` (nodes,
//! property values, transient changes), `path.rs` (absolute path helpers), `xpath.rs`
//! (the XPath subset understood by the in-memory store), `memory.rs` (in-process
//! repository), `rest.rs` (HTTP/JSON transport), `error.rs`.

pub mod error;
pub mod memory;
pub mod model;
pub mod path;
pub mod rest;
pub mod session;
pub mod xpath;

pub use error::{RepositoryError, RepositoryResult};
pub use memory::{MemoryRepository, MemorySession};
pub use model::{Change, Credentials, Node, PropertyValue, QueryLanguage};
pub use rest::{RestRepository, RestSession};
pub use session::{Repository, RepositorySession};
