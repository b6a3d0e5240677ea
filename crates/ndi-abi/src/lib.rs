//! NDI ABI crate: the C contracts shared between the host bridge and the
//! vendor runtime it loads at startup.

pub mod ffi;

pub use ffi::*;
