//! filekeep-core: backend-agnostic persistence for fetched binary files.
//!
//! Two interchangeable storage facilities sit behind one small API:
//! a quota-bounded sandbox directory and a transactional object store.
//! One of them is selected the first time it is needed and kept for the
//! life of the process.
//!
//! ```text
//! caller  ->  FileKeep  ->  StorageRouter  ->  StorageBackend (sandbox | object store)
//!                                                   |-> Fetcher (remote bytes)
//!                                                   '-> FileRegistry (name -> handle)
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use filekeep_core::FileKeep;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let keep = FileKeep::load(None)?;
//!     keep.init_enumerate().await?;
//!     let handle = keep.save("https://example.com/files/report.pdf?v=2").await?;
//!     println!("report.pdf -> {}", handle.url());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
mod deadline;
pub mod error;
pub mod fetch;
mod filekeep;
pub mod handle;
mod locks;
pub mod name;
pub mod objstore;
pub mod registry;
pub mod router;
pub mod safe_io;
pub mod sandbox;

// Re-export the facade
pub use filekeep::FileKeep;

// Re-export commonly used types
pub use backend::{BackendKind, StorageBackend};
pub use config::Config;
pub use error::{Result, StoreError};
pub use fetch::{Fetcher, HttpFetcher, StaticFetcher};
pub use handle::FileHandle;
pub use name::logical_name;
pub use objstore::ObjectStoreBackend;
pub use registry::{FileRegistry, RegistrySnapshot};
pub use router::{BackendSelection, StorageRouter};
pub use sandbox::SandboxBackend;
