use std::path::PathBuf;

use thiserror::Error;

use crate::runtime::RuntimeState;

/// Why a single candidate was rejected. Logged and skipped, never returned
/// from `Resolver::resolve`.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("failed to load {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("missing symbol {symbol} in {path}: {source}")]
    MissingSymbol {
        path: PathBuf,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("{symbol} in {path} returned a null table")]
    NullTable { path: PathBuf, symbol: &'static str },

    #[error("{0}")]
    Msg(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("NDI runtime not found (searched {} location(s))", .searched.len())]
    NotFound { searched: Vec<PathBuf> },

    #[error("an NDI runtime library is already loaded in this process")]
    AlreadyLoaded,
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("NDI runtime refused to initialize; this CPU may not be supported")]
    Unsupported,

    #[error("runtime initialization already attempted (state: {0:?})")]
    AlreadyAttempted(RuntimeState),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to create NDI finder")]
    CreateFailed,

    #[error("NDI runtime is not initialized (state: {0:?})")]
    RuntimeNotReady(RuntimeState),

    #[error("invalid discovery setting {field}: contains a NUL byte")]
    InvalidConfig { field: &'static str },
}

/// Umbrella error for `NdiBridge` startup and reconfiguration.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl BridgeError {
    /// User-facing hint for the host's error dialog.
    pub fn remediation(&self) -> &'static str {
        match self {
            BridgeError::Load(LoadError::NotFound { .. }) => missing_runtime_hint(),
            BridgeError::Load(LoadError::AlreadyLoaded) => {
                "The NDI runtime is already in use by this application. Restart it and try again."
            }
            BridgeError::Init(_) => {
                "The NDI runtime could not start. Your CPU may not be supported by NDI."
            }
            BridgeError::Discovery(_) => {
                "NDI source discovery could not be started. Check the extra IP list in the NDI settings."
            }
        }
    }
}

#[cfg(target_os = "windows")]
fn missing_runtime_hint() -> &'static str {
    "The NDI 5 Runtime was not found. Install it from https://ndi.video/tools/ and restart the application."
}

#[cfg(target_os = "macos")]
fn missing_runtime_hint() -> &'static str {
    "The NDI 5 Runtime was not found. Install the NDI SDK for Apple (or libndi) and restart the application."
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn missing_runtime_hint() -> &'static str {
    "The NDI 5 Runtime was not found. Install libndi (libndi.so.5) into /usr/lib or /usr/local/lib, \
     or point NDI_RUNTIME_DIR_V5 at its directory, then restart the application."
}

pub type Result<T> = std::result::Result<T, BridgeError>;
