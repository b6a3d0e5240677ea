use std::{
    ffi::CStr,
    fmt,
    path::{Path, PathBuf},
    ptr::NonNull,
    sync::atomic::{AtomicBool, Ordering},
};

use libloading::{Library, Symbol};
use ndi_abi::{NDILIB_ENTRY_SYMBOL, NdiLibV5, NdiLoadFn};
use tracing::{debug, error, info, warn};

use crate::errors::{CandidateError, LoadError};
use crate::paths::{CandidatePaths, NDI_LIBRARY_NAME};

/// A module mapped into the process. Dropping it unloads the module.
pub trait RuntimeModule: Send + Sync {
    /// Resolve `NDIlib_v5_load` and call it.
    fn load_table(&self) -> Result<NonNull<NdiLibV5>, CandidateError>;
}

/// Opens one candidate file (or bare name for OS default search).
pub trait ModuleLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn RuntimeModule>, CandidateError>;

    /// Modules from this loader count against the one-runtime-per-process rule.
    fn process_exclusive(&self) -> bool {
        false
    }
}

/// `libloading` backed loader used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLoader;

pub struct SharedLibrary {
    lib: Library,
    path: PathBuf,
}

impl ModuleLoader for SystemLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn RuntimeModule>, CandidateError> {
        // SAFETY: loading runs the module's initializers; candidates come from the
        // env override or fixed system lib dirs and are expected to be the vendor runtime.
        let lib = unsafe { Library::new(path) }.map_err(|source| CandidateError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Box::new(SharedLibrary {
            lib,
            path: path.to_path_buf(),
        }))
    }

    fn process_exclusive(&self) -> bool {
        true
    }
}

impl RuntimeModule for SharedLibrary {
    fn load_table(&self) -> Result<NonNull<NdiLibV5>, CandidateError> {
        // SAFETY: the vendor header declares `NDIlib_v5_load` as `const NDIlib_v5*(void)`.
        let entry: Symbol<NdiLoadFn> =
            unsafe { self.lib.get(NDILIB_ENTRY_SYMBOL.as_bytes()) }.map_err(|source| {
                CandidateError::MissingSymbol {
                    path: self.path.clone(),
                    symbol: NDILIB_ENTRY_SYMBOL,
                    source,
                }
            })?;

        let api = unsafe { entry() };
        NonNull::new(api as *mut NdiLibV5).ok_or_else(|| CandidateError::NullTable {
            path: self.path.clone(),
            symbol: NDILIB_ENTRY_SYMBOL,
        })
    }
}

static SYSTEM_RUNTIME_LOADED: AtomicBool = AtomicBool::new(false);

/// Held by a system-loaded `NdiLibrary`; frees the process slot on drop.
struct ProcessSlot;

impl ProcessSlot {
    fn claim() -> Option<Self> {
        SYSTEM_RUNTIME_LOADED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ProcessSlot)
    }
}

impl Drop for ProcessSlot {
    fn drop(&mut self) {
        SYSTEM_RUNTIME_LOADED.store(false, Ordering::Release);
    }
}

/// The loaded runtime module plus the capability table it handed out.
///
/// The table is only reachable through `&self`, so it cannot outlive the module.
pub struct NdiLibrary {
    api: NonNull<NdiLibV5>,
    // Field order matters: the module unloads before the process slot is released.
    _module: Box<dyn RuntimeModule>,
    path: PathBuf,
    _slot: Option<ProcessSlot>,
}

// SAFETY: the table is an immutable array of function pointers owned by the module,
// and the module itself is Send + Sync.
unsafe impl Send for NdiLibrary {}
unsafe impl Sync for NdiLibrary {}

impl NdiLibrary {
    pub fn api(&self) -> &NdiLibV5 {
        // SAFETY: non-null, produced by the module's entry point, and `self._module`
        // keeps the backing storage mapped for as long as `self` lives.
        unsafe { self.api.as_ref() }
    }

    /// File the runtime was loaded from (bare name for OS default search).
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> Option<String> {
        let ptr = unsafe { (self.api().version)() };
        if ptr.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }

    pub fn supports_cpu(&self) -> bool {
        unsafe { (self.api().is_supported_cpu)() }
    }
}

impl fmt::Debug for NdiLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdiLibrary")
            .field("path", &self.path)
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

/// Walks `CandidatePaths` and loads the first usable runtime.
pub struct Resolver<L = SystemLoader> {
    candidates: CandidatePaths,
    loader: L,
    file_name: String,
}

impl Resolver<SystemLoader> {
    /// `$NDI_RUNTIME_DIR_V5` + platform dirs, loaded through `libloading`.
    pub fn from_env() -> Self {
        Self::new(CandidatePaths::from_env(), SystemLoader)
    }
}

impl<L: ModuleLoader> Resolver<L> {
    pub fn new(candidates: CandidatePaths, loader: L) -> Self {
        Self {
            candidates,
            loader,
            file_name: NDI_LIBRARY_NAME.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn candidates(&self) -> &CandidatePaths {
        &self.candidates
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// First candidate that exists, loads and yields a table wins.
    /// Modules from rejected candidates are unloaded before moving on.
    pub fn resolve(&self) -> Result<NdiLibrary, LoadError> {
        let slot = if self.loader.process_exclusive() {
            Some(ProcessSlot::claim().ok_or(LoadError::AlreadyLoaded)?)
        } else {
            None
        };

        let mut searched = Vec::with_capacity(self.candidates.dirs().len() + 1);

        for dir in self.candidates.dirs() {
            debug!(dir = %dir.display(), "trying NDI runtime path");
            let path = dir.join(&self.file_name);
            searched.push(dir.clone());

            if !path.is_file() {
                continue;
            }
            info!(path = %path.display(), "found NDI library file");

            match self.try_candidate(&path) {
                Ok((module, api)) => {
                    info!(path = %path.display(), "NDI runtime loaded");
                    return Ok(NdiLibrary {
                        api,
                        _module: module,
                        path,
                        _slot: slot,
                    });
                }
                Err(e) => warn!(error = %e, "skipping NDI runtime candidate"),
            }
        }

        if self.candidates.os_default() {
            let bare = PathBuf::from(&self.file_name);
            debug!(name = %bare.display(), "trying OS default library search");
            searched.push(bare.clone());

            match self.try_candidate(&bare) {
                Ok((module, api)) => {
                    info!(name = %bare.display(), "NDI runtime loaded via OS search");
                    return Ok(NdiLibrary {
                        api,
                        _module: module,
                        path: bare,
                        _slot: slot,
                    });
                }
                Err(e) => warn!(error = %e, "OS default search did not yield the NDI runtime"),
            }
        }

        error!(searched = searched.len(), "can't find the NDI 5 library");
        Err(LoadError::NotFound { searched })
    }

    fn try_candidate(
        &self,
        path: &Path,
    ) -> Result<(Box<dyn RuntimeModule>, NonNull<NdiLibV5>), CandidateError> {
        let module = self.loader.open(path)?;
        // On error `module` drops here, unloading it before the next candidate.
        let api = module.load_table()?;
        Ok((module, api))
    }
}
