//! Operating system abstraction layer
//!
//! This module provides a unified, platform-independent interface to the
//! operating system services the generator depends on.
//!
//! Platform-specific implementations are selected at compile time using
//! conditional compilation. Each submodule exposes the same surface:
//!
//! - `sys_random`: fill a buffer with kernel entropy
//!
//! Process identity and fork notification are implemented here directly,
//! since they only differ between Unix and everything else.

#[cfg(target_os = "macos")]
pub(crate) mod macos;

#[cfg(target_os = "macos")]
pub(crate) use macos::*;

#[cfg(target_os = "linux")]
pub(crate) mod linux;

#[cfg(target_os = "linux")]
pub(crate) use linux::*;

#[cfg(target_os = "windows")]
pub(crate) mod windows;

#[cfg(target_os = "windows")]
pub(crate) use windows::*;

/// Identifier of the calling process.
///
/// Queried on every call: a forked child must observe its own id, never a
/// value cached by its parent.
pub(crate) fn process_id() -> u32 {
    std::process::id()
}

/// Registers `handler` to run in the child right after `fork()`.
///
/// Returns `false` if the registration was refused. Callers still detect
/// duplication through [`process_id`] in that case.
#[cfg(unix)]
pub(crate) fn register_fork_child_handler(handler: extern "C" fn()) -> bool {
    let child: unsafe extern "C" fn() = handler;

    // SAFETY: `handler` is a plain function with no captured state, and
    // pthread_atfork only stores the pointer.
    unsafe { libc::pthread_atfork(None, None, Some(child)) == 0 }
}

#[cfg(not(unix))]
pub(crate) fn register_fork_child_handler(_handler: extern "C" fn()) -> bool {
    false
}
