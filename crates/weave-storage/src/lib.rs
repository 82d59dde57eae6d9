//! I/O adapters for the weave embed engine.
//!
//! The engine never touches the OS directly. This crate provides the two
//! seams through which all I/O funnels:
//!
//! - [`FileSystem`]: `exists`, `read` and `base_path` over the document store
//! - [`Transport`]: a single `request(url) -> text` primitive
//!
//! # Implementations
//!
//! - [`FsStorage`]: local filesystem via `tokio::fs`
//! - [`UreqTransport`]: HTTP(S) via a blocking `ureq` agent
//! - [`MockStorage`] and [`MockTransport`]: in-memory doubles that count I/O
//!   (behind the `mock` feature flag)

mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;
mod transport;

pub use fs::FsStorage;
#[cfg(feature = "mock")]
pub use mock::{MockStorage, MockTransport};
pub use storage::{FileSystem, StorageError, StorageErrorKind};
pub use transport::{DEFAULT_TIMEOUT, Transport, TransportError, UreqTransport};
