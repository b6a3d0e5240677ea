use std::sync::Arc;

use ndi_abi::NdiLibV5;
use tracing::info;

use crate::config::DiscoveryConfig;
use crate::discovery::DiscoveryHandle;
use crate::errors::{DiscoveryError, Result};
use crate::loader::{ModuleLoader, NdiLibrary, Resolver};
use crate::runtime::RuntimeManager;

/// Top-level NDI state owned by the host controller.
///
/// Input/output collaborators borrow the capability table from here (or hold
/// an `Arc<NdiLibrary>`, which keeps the module mapped).
pub struct NdiBridge {
    runtime: RuntimeManager,
}

impl NdiBridge {
    /// Resolve from `$NDI_RUNTIME_DIR_V5` + platform dirs, init, start discovery.
    pub fn start(config: &DiscoveryConfig) -> Result<Self> {
        Self::start_with(&Resolver::from_env(), config)
    }

    /// Startup sequence: load → init → first finder. Anything acquired before a
    /// failing step is released before the error is returned.
    pub fn start_with<L: ModuleLoader>(
        resolver: &Resolver<L>,
        config: &DiscoveryConfig,
    ) -> Result<Self> {
        let library = Arc::new(resolver.resolve()?);
        let mut runtime = RuntimeManager::new(library);

        runtime.initialize()?;
        runtime.restart_discovery(config)?;

        info!(
            path = %runtime.library().path().display(),
            version = runtime.library().version().as_deref().unwrap_or("unknown"),
            "NDI runtime finished loading"
        );
        Ok(Self { runtime })
    }

    /// Host calls this after the user changes discovery settings.
    pub fn restart_discovery(
        &mut self,
        config: &DiscoveryConfig,
    ) -> std::result::Result<(), DiscoveryError> {
        self.runtime.restart_discovery(config)
    }

    pub fn is_ready(&self) -> bool {
        self.runtime.is_ready()
    }

    pub fn api(&self) -> &NdiLibV5 {
        self.runtime.library().api()
    }

    pub fn library(&self) -> &Arc<NdiLibrary> {
        self.runtime.library()
    }

    pub fn discovery(&self) -> Option<&DiscoveryHandle> {
        self.runtime.discovery()
    }

    pub fn runtime(&self) -> &RuntimeManager {
        &self.runtime
    }

    /// Finder → runtime now; the library goes with the last reference.
    pub fn teardown(&mut self) {
        self.runtime.teardown();
    }
}
