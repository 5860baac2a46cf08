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

//! Run configuration for the updater runner, loaded from Java-style `.properties` files.
//!
//! Layout: `properties.rs` (file syntax), `model.rs` (typed run configuration),
//! `validate.rs` (key lookup and validation), `loader.rs` (file loading and merging).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod properties;
pub mod validate;

pub use defaults::{
    DEFAULT_CONFIG_FILE, DEFAULT_MAX_SLEEP_INTERVAL_SECS, KEY_GROOVY_SCRIPTS,
    KEY_MAX_SLEEP_INTERVAL, KEY_REPOSITORY_PASS, KEY_REPOSITORY_URL, KEY_REPOSITORY_USER,
    KEY_WAIT_UNTIL_DONE, SCRIPT_SEPARATOR,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_files, load_run_configuration};
pub use model::{RepositoryCredentials, RunConfiguration, SelectedUpdaters};
pub use properties::Properties;
