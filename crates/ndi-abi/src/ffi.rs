use core::ffi::{c_char, c_void};

/// Exported by the runtime library; returns a pointer to its static `NdiLibV5`.
pub const NDILIB_ENTRY_SYMBOL: &str = "NDIlib_v5_load";

/// Environment variable the NDI redistributable installer sets to its lib folder.
pub const NDILIB_REDIST_FOLDER: &str = "NDI_RUNTIME_DIR_V5";

/// Opaque finder session owned by the runtime.
pub type FindInstance = *mut c_void;

#[repr(C)]
pub struct FindCreateDesc {
    pub show_local_sources: bool,
    /// Comma separated group list, or null for "all groups".
    pub p_groups: *const c_char,
    /// Extra addresses to query, passed verbatim to the runtime.
    pub p_extra_ips: *const c_char,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Source {
    pub p_ndi_name: *const c_char,
    pub p_url_address: *const c_char,
}

// ---------- Function pointer types (C ABI) ----------

pub type InitializeFn = unsafe extern "C" fn() -> bool;
pub type DestroyFn = unsafe extern "C" fn();
pub type VersionFn = unsafe extern "C" fn() -> *const c_char;
pub type IsSupportedCpuFn = unsafe extern "C" fn() -> bool;

pub type FindCreateFn = unsafe extern "C" fn(desc: *const FindCreateDesc) -> FindInstance;
pub type FindDestroyFn = unsafe extern "C" fn(instance: FindInstance);

/// Returns a runtime-owned array valid until the next call on the same instance.
pub type FindGetSourcesFn = unsafe extern "C" fn(
    instance: FindInstance,
    no_sources: *mut u32,
    timeout_in_ms: u32,
) -> *const Source;

// ---------- VTable ----------

/// Leading entries of the vendor `NDIlib_v5` table.
///
/// Only ever accessed through the pointer returned by the entry symbol, so the
/// declared prefix may be shorter than the runtime's full table. Field order
/// must match the vendor header.
#[repr(C)]
pub struct NdiLibV5 {
    pub initialize: InitializeFn,
    pub destroy: DestroyFn,
    pub version: VersionFn,
    pub is_supported_cpu: IsSupportedCpuFn,

    /// Deprecated v1 creator, kept for layout.
    pub find_create: FindCreateFn,
    pub find_create_v2: FindCreateFn,
    pub find_destroy: FindDestroyFn,
    pub find_get_sources: FindGetSourcesFn,
}

/// Signature of `NDIlib_v5_load`.
pub type NdiLoadFn = unsafe extern "C" fn() -> *const NdiLibV5;
