//! Vault filesystem abstraction for litvault
//!
//! Provides normalized vault-relative paths, content checksums, atomic
//! file I/O, and the `VaultSink` trait the sync engine writes through.

pub mod checksum;
pub mod error;
pub mod io;
pub mod path;
pub mod sink;

pub use error::{Error, Result};
pub use path::VaultPath;
pub use sink::{FsVault, VaultSink};
