use std::{
    env,
    path::{Path, PathBuf},
};

use ndi_abi::NDILIB_REDIST_FOLDER;

/// OS-specific runtime file name.
#[cfg(all(target_os = "windows", target_pointer_width = "64"))]
pub const NDI_LIBRARY_NAME: &str = "Processing.NDI.Lib.x64.dll";
#[cfg(all(target_os = "windows", not(target_pointer_width = "64")))]
pub const NDI_LIBRARY_NAME: &str = "Processing.NDI.Lib.x86.dll";
#[cfg(target_os = "macos")]
pub const NDI_LIBRARY_NAME: &str = "libndi.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const NDI_LIBRARY_NAME: &str = "libndi.so.5";

/// Conventional lib dirs checked after the env override.
#[cfg(target_os = "windows")]
pub const PLATFORM_FALLBACK_DIRS: &[&str] = &[];
#[cfg(target_os = "macos")]
pub const PLATFORM_FALLBACK_DIRS: &[&str] = &[
    "/usr/lib",
    "/usr/lib64",
    "/usr/local/lib",
    "/usr/local/lib64",
    "/Library/NDI SDK for Apple/lib/macOS",
];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const PLATFORM_FALLBACK_DIRS: &[&str] = &[
    "/usr/lib",
    "/usr/lib64",
    "/usr/lib/x86_64-linux-gnu",
    "/usr/local/lib",
    "/usr/local/lib64",
];

/// Ordered search list for the runtime library. First usable match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePaths {
    dirs: Vec<PathBuf>,
    os_default: bool,
}

impl CandidatePaths {
    /// `$NDI_RUNTIME_DIR_V5` (if set) followed by the platform fallbacks.
    pub fn from_env() -> Self {
        let override_dir = env::var_os(NDILIB_REDIST_FOLDER).map(PathBuf::from);
        Self::from_parts(override_dir, PLATFORM_FALLBACK_DIRS)
    }

    /// Empty overrides are treated as unset. Windows has no conventional lib
    /// dirs, so it also allows a last attempt through the loader's own search.
    pub fn from_parts<P: AsRef<Path>>(override_dir: Option<PathBuf>, fallbacks: &[P]) -> Self {
        let mut dirs = Vec::with_capacity(fallbacks.len() + 1);
        if let Some(dir) = override_dir.filter(|d| !d.as_os_str().is_empty()) {
            dirs.push(dir);
        }
        dirs.extend(fallbacks.iter().map(|p| p.as_ref().to_path_buf()));

        Self {
            dirs,
            os_default: cfg!(target_os = "windows"),
        }
    }

    /// Exactly these directories, no OS default search.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
            os_default: false,
        }
    }

    pub fn with_os_default(mut self, enabled: bool) -> Self {
        self.os_default = enabled;
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn os_default(&self) -> bool {
        self.os_default
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && !self.os_default
    }
}
