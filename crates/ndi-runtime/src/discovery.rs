use core::ffi::c_void;
use std::{
    ffi::{CStr, CString},
    ptr::{self, NonNull},
    slice,
    sync::Arc,
};

use ndi_abi::FindCreateDesc;
use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::errors::DiscoveryError;
use crate::loader::NdiLibrary;

/// A source reported by the finder, copied out of runtime memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSource {
    pub name: String,
    pub url_address: Option<String>,
}

/// Live finder session. Destroyed on drop.
///
/// Holds its own reference to the library so the runtime cannot be unloaded
/// underneath it; `RuntimeManager` owns it privately and drops it before
/// uninitializing the runtime.
pub struct DiscoveryHandle {
    instance: NonNull<c_void>,
    config: DiscoveryConfig,
    library: Arc<NdiLibrary>,
}

// SAFETY: the finder is only touched from the thread that currently owns the handle.
unsafe impl Send for DiscoveryHandle {}

impl DiscoveryHandle {
    pub(crate) fn create(
        library: &Arc<NdiLibrary>,
        config: &DiscoveryConfig,
    ) -> Result<Self, DiscoveryError> {
        let extra_ips = CString::new(config.extra_ips.as_str())
            .map_err(|_| DiscoveryError::InvalidConfig { field: "extra_ips" })?;
        let groups = config
            .groups
            .as_deref()
            .map(CString::new)
            .transpose()
            .map_err(|_| DiscoveryError::InvalidConfig { field: "groups" })?;

        // CStrings above outlive the call; the runtime copies what it keeps.
        let desc = FindCreateDesc {
            show_local_sources: config.show_local_sources,
            p_groups: groups.as_ref().map_or(ptr::null(), |g| g.as_ptr()),
            p_extra_ips: extra_ips.as_ptr(),
        };

        let raw = unsafe { (library.api().find_create_v2)(&desc) };
        let instance = NonNull::new(raw).ok_or(DiscoveryError::CreateFailed)?;
        debug!(extra_ips = %config.extra_ips, "created NDI finder");

        Ok(Self {
            instance,
            config: config.clone(),
            library: Arc::clone(library),
        })
    }

    /// Settings this finder was created with.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Sources currently known to the finder, waiting up to `timeout_ms` for
    /// the first answers.
    pub fn sources(&self, timeout_ms: u32) -> Vec<DiscoveredSource> {
        let mut count: u32 = 0;
        let arr = unsafe {
            (self.library.api().find_get_sources)(self.instance.as_ptr(), &mut count, timeout_ms)
        };
        if arr.is_null() || count == 0 {
            return Vec::new();
        }

        // Array is owned by the runtime until the next call on this finder.
        let raw = unsafe { slice::from_raw_parts(arr, count as usize) };
        raw.iter()
            .filter_map(|s| {
                let name = unsafe { opt_string(s.p_ndi_name) }?;
                Some(DiscoveredSource {
                    name,
                    url_address: unsafe { opt_string(s.p_url_address) },
                })
            })
            .collect()
    }
}

impl Drop for DiscoveryHandle {
    fn drop(&mut self) {
        unsafe { (self.library.api().find_destroy)(self.instance.as_ptr()) };
        debug!("destroyed NDI finder");
    }
}

unsafe fn opt_string(p: *const core::ffi::c_char) -> Option<String> {
    if p.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
}
