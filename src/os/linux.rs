//! Operating system abstraction layer (Linux)
//!
//! On Linux, `getrandom` provides direct access to the kernel entropy pool.
//! Without flags it blocks until the pool is initialized, and never after,
//! which is exactly the contract the generator expects from its entropy
//! source.

use libc::{EINTR, c_void, getrandom};

use crate::rng::EntropyError;

/// Fills a buffer with cryptographically secure random bytes from the OS.
///
/// This function repeatedly calls the Linux `getrandom` system call until
/// the entire buffer is filled. Partial reads are handled transparently,
/// and calls interrupted by a signal are retried.
///
/// # Errors
/// Returns [`EntropyError::Os`] with the errno value for any other failure.
pub(crate) fn sys_random(buf: &mut [u8]) -> Result<(), EntropyError> {
    let mut filled = 0;

    while filled < buf.len() {
        let rest = &mut buf[filled..];
        // SAFETY: the pointer and length describe the unfilled, writable tail
        // of `buf`.
        let ret = unsafe { getrandom(rest.as_mut_ptr() as *mut c_void, rest.len(), 0) };

        if ret < 0 {
            let code = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
            if code == EINTR {
                continue;
            }
            return Err(EntropyError::Os {
                call: "getrandom",
                code: i64::from(code),
            });
        }

        filled += ret as usize;
    }

    Ok(())
}
