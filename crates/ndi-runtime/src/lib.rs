//! ndi-runtime
//!
//! Blocking, single-thread lifecycle for the vendor NDI runtime:
//! - Locates `libndi` from the env override + platform lib dirs and loads it.
//! - Resolves `NDIlib_v5_load` to get the capability table.
//! - Initializes the runtime once and owns the discovery (finder) session.
//!
//! Teardown order is enforced by ownership: finder → runtime → library.

pub mod config;
pub mod context;
pub mod discovery;
pub mod errors;
pub mod loader;
pub mod paths;
pub mod runtime;

pub use config::DiscoveryConfig;
pub use context::NdiBridge;
pub use discovery::{DiscoveredSource, DiscoveryHandle};
pub use errors::{BridgeError, CandidateError, DiscoveryError, InitError, LoadError};
pub use loader::{ModuleLoader, NdiLibrary, Resolver, RuntimeModule, SharedLibrary, SystemLoader};
pub use paths::{CandidatePaths, NDI_LIBRARY_NAME, PLATFORM_FALLBACK_DIRS};
pub use runtime::{RuntimeManager, RuntimeState};
