// One-time runtime init/destroy plus the single live finder.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::DiscoveryConfig;
use crate::discovery::DiscoveryHandle;
use crate::errors::{DiscoveryError, InitError};
use crate::loader::NdiLibrary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Uninitialized,
    Initialized,
    Failed,
}

/// Owns runtime initialization and the discovery handle for one loaded library.
///
/// Dropping the manager runs `teardown`, so the finder is destroyed and the
/// runtime uninitialized before the library reference is released.
pub struct RuntimeManager {
    finder: Option<DiscoveryHandle>,
    state: RuntimeState,
    attempted: bool,
    library: Arc<NdiLibrary>,
}

impl RuntimeManager {
    pub fn new(library: Arc<NdiLibrary>) -> Self {
        Self {
            finder: None,
            state: RuntimeState::Uninitialized,
            attempted: false,
            library,
        }
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == RuntimeState::Initialized
    }

    pub fn library(&self) -> &Arc<NdiLibrary> {
        &self.library
    }

    pub fn discovery(&self) -> Option<&DiscoveryHandle> {
        self.finder.as_ref()
    }

    /// Call exactly once. A repeat call is rejected without touching the runtime.
    pub fn initialize(&mut self) -> Result<(), InitError> {
        if self.attempted {
            error!(state = ?self.state, "NDI runtime initialization requested twice");
            return Err(InitError::AlreadyAttempted(self.state));
        }
        self.attempted = true;

        if unsafe { (self.library.api().initialize)() } {
            self.state = RuntimeState::Initialized;
            debug!("initialized NDIlib");
            Ok(())
        } else {
            self.state = RuntimeState::Failed;
            error!(
                cpu_supported = self.library.supports_cpu(),
                "NDIlib failed to initialize; your CPU may not be supported"
            );
            Err(InitError::Unsupported)
        }
    }

    /// Destroy the current finder (if any), then create one from `config`.
    /// On failure no finder is left alive.
    pub fn restart_discovery(&mut self, config: &DiscoveryConfig) -> Result<(), DiscoveryError> {
        if self.state != RuntimeState::Initialized {
            return Err(DiscoveryError::RuntimeNotReady(self.state));
        }

        // Old finder must be gone before the runtime sees a second create.
        if self.finder.take().is_some() {
            debug!("released previous NDI finder");
        }

        match DiscoveryHandle::create(&self.library, config) {
            Ok(handle) => {
                self.finder = Some(handle);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to create NDI finder");
                Err(e)
            }
        }
    }

    /// Finder → runtime. Safe to call in any state and more than once.
    pub fn teardown(&mut self) {
        drop(self.finder.take());

        if self.state == RuntimeState::Initialized {
            unsafe { (self.library.api().destroy)() };
            debug!("destroyed NDIlib");
        } else if self.state == RuntimeState::Failed {
            warn!("tearing down NDI runtime that never initialized");
        }
        self.state = RuntimeState::Uninitialized;
    }
}

impl Drop for RuntimeManager {
    fn drop(&mut self) {
        self.teardown();
    }
}
