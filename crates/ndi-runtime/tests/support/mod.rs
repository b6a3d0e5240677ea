//! In-process stand-in for the vendor runtime.
//!
//! `FakeLoader` decides what a candidate file "is" from its contents:
//! `ok` loads and exports the entry symbol, `nosym` loads without it, anything
//! else fails to load. Every runtime call is recorded per test thread.

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    ffi::{CStr, CString, c_char},
    fs,
    path::{Path, PathBuf},
    ptr::{self, NonNull},
};

use ndi_abi::{FindCreateDesc, FindInstance, NdiLibV5, Source};
use ndi_runtime::{CandidateError, ModuleLoader, NDI_LIBRARY_NAME, RuntimeModule};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(PathBuf),
    Unload(PathBuf),
    Initialize,
    Destroy,
    FindCreate {
        id: usize,
        show_local_sources: bool,
        extra_ips: String,
        groups: Option<String>,
    },
    FindCreateRejected,
    FindDestroy(usize),
}

thread_local! {
    static CALLS: RefCell<Vec<Call>> = const { RefCell::new(Vec::new()) };
    static INIT_OK: Cell<bool> = const { Cell::new(true) };
    static CREATE_OK: Cell<bool> = const { Cell::new(true) };
    static NEXT_ID: Cell<usize> = const { Cell::new(1) };
    static LIVE: Cell<usize> = const { Cell::new(0) };
}

fn record(call: Call) {
    CALLS.with(|c| c.borrow_mut().push(call));
}

pub fn calls() -> Vec<Call> {
    CALLS.with(|c| c.borrow().clone())
}

pub fn clear_calls() {
    CALLS.with(|c| c.borrow_mut().clear());
}

pub fn set_init_ok(ok: bool) {
    INIT_OK.with(|c| c.set(ok));
}

pub fn set_create_ok(ok: bool) {
    CREATE_OK.with(|c| c.set(ok));
}

pub fn live_finders() -> usize {
    LIVE.with(Cell::get)
}

/// Ids of finders created and not yet destroyed, from the call log.
pub fn live_finder_ids() -> Vec<usize> {
    let mut live = Vec::new();
    for call in calls() {
        match call {
            Call::FindCreate { id, .. } => live.push(id),
            Call::FindDestroy(id) => live.retain(|l| *l != id),
            _ => {}
        }
    }
    live
}

// ---------- fake runtime table ----------

struct FakeFinder {
    id: usize,
    _strings: Vec<CString>,
    sources: Vec<Source>,
}

unsafe fn opt_string(p: *const c_char) -> Option<String> {
    if p.is_null() {
        None
    } else {
        Some(CStr::from_ptr(p).to_string_lossy().into_owned())
    }
}

unsafe extern "C" fn fake_initialize() -> bool {
    record(Call::Initialize);
    INIT_OK.with(Cell::get)
}

unsafe extern "C" fn fake_destroy() {
    record(Call::Destroy);
}

unsafe extern "C" fn fake_version() -> *const c_char {
    c"NDI SDK LINUX 5.6.0 (fake)".as_ptr()
}

unsafe extern "C" fn fake_is_supported_cpu() -> bool {
    INIT_OK.with(Cell::get)
}

unsafe extern "C" fn fake_find_create(desc: *const FindCreateDesc) -> FindInstance {
    if !CREATE_OK.with(Cell::get) {
        record(Call::FindCreateRejected);
        return ptr::null_mut();
    }

    let desc = &*desc;
    let extra_ips = opt_string(desc.p_extra_ips).unwrap_or_default();
    let groups = opt_string(desc.p_groups);

    let id = NEXT_ID.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    });
    LIVE.with(|l| l.set(l.get() + 1));

    // One local source, plus one per extra address.
    let mut strings = Vec::new();
    if desc.show_local_sources {
        strings.push((CString::new("TEST-HOST (Camera 1)").unwrap(), None));
    }
    for ip in extra_ips.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        strings.push((
            CString::new(format!("REMOTE ({ip})")).unwrap(),
            Some(CString::new(format!("{ip}:5961")).unwrap()),
        ));
    }
    let sources = strings
        .iter()
        .map(|(name, url)| Source {
            p_ndi_name: name.as_ptr(),
            p_url_address: url.as_ref().map_or(ptr::null(), |u| u.as_ptr()),
        })
        .collect();
    let owned = strings
        .into_iter()
        .flat_map(|(n, u)| std::iter::once(n).chain(u))
        .collect();

    record(Call::FindCreate {
        id,
        show_local_sources: desc.show_local_sources,
        extra_ips,
        groups,
    });

    Box::into_raw(Box::new(FakeFinder {
        id,
        _strings: owned,
        sources,
    })) as FindInstance
}

unsafe extern "C" fn fake_find_destroy(instance: FindInstance) {
    let finder = Box::from_raw(instance as *mut FakeFinder);
    LIVE.with(|l| l.set(l.get() - 1));
    record(Call::FindDestroy(finder.id));
}

unsafe extern "C" fn fake_find_get_sources(
    instance: FindInstance,
    no_sources: *mut u32,
    _timeout_in_ms: u32,
) -> *const Source {
    let finder = &*(instance as *const FakeFinder);
    *no_sources = finder.sources.len() as u32;
    finder.sources.as_ptr()
}

pub static FAKE_API: NdiLibV5 = NdiLibV5 {
    initialize: fake_initialize,
    destroy: fake_destroy,
    version: fake_version,
    is_supported_cpu: fake_is_supported_cpu,
    find_create: fake_find_create,
    find_create_v2: fake_find_create,
    find_destroy: fake_find_destroy,
    find_get_sources: fake_find_get_sources,
};

// ---------- fake loader ----------

pub struct FakeModule {
    path: PathBuf,
    exports_entry: bool,
}

impl RuntimeModule for FakeModule {
    fn load_table(&self) -> Result<NonNull<NdiLibV5>, CandidateError> {
        if self.exports_entry {
            Ok(NonNull::from(&FAKE_API))
        } else {
            Err(CandidateError::Msg(format!(
                "NDIlib_v5_load not found in {}",
                self.path.display()
            )))
        }
    }
}

impl Drop for FakeModule {
    fn drop(&mut self) {
        record(Call::Unload(self.path.clone()));
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FakeLoader;

impl ModuleLoader for FakeLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn RuntimeModule>, CandidateError> {
        record(Call::Open(path.to_path_buf()));
        let contents = fs::read_to_string(path).map_err(|e| CandidateError::Msg(e.to_string()))?;
        match contents.trim() {
            "ok" => Ok(Box::new(FakeModule {
                path: path.to_path_buf(),
                exports_entry: true,
            })),
            "nosym" => Ok(Box::new(FakeModule {
                path: path.to_path_buf(),
                exports_entry: false,
            })),
            other => Err(CandidateError::Msg(format!(
                "{}: not a shared object ({other})",
                path.display()
            ))),
        }
    }
}

/// Resolves bare file names the way the platform loader's own search would;
/// paths with a directory go through `FakeLoader`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSearchLoader;

impl ModuleLoader for OsSearchLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn RuntimeModule>, CandidateError> {
        let bare = path.parent().map_or(true, |p| p.as_os_str().is_empty());
        if !bare {
            return FakeLoader.open(path);
        }
        record(Call::Open(path.to_path_buf()));
        Ok(Box::new(FakeModule {
            path: path.to_path_buf(),
            exports_entry: true,
        }))
    }
}

/// Create `dir` and drop a fake runtime file of the given kind into it.
pub fn install(dir: &Path, kind: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(NDI_LIBRARY_NAME);
    fs::write(&path, kind).unwrap();
    path
}
