use libc::{c_void, getentropy};

use crate::rng::EntropyError;

/// Largest request `getentropy` accepts in one call.
const GETENTROPY_MAX: usize = 256;

pub(crate) fn sys_random(buf: &mut [u8]) -> Result<(), EntropyError> {
    for chunk in buf.chunks_mut(GETENTROPY_MAX) {
        // SAFETY: `chunk` is writable and at most 256 bytes long.
        let ret = unsafe { getentropy(chunk.as_mut_ptr() as *mut c_void, chunk.len()) };

        if ret != 0 {
            let code = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
            return Err(EntropyError::Os {
                call: "getentropy",
                code: i64::from(code),
            });
        }
    }

    Ok(())
}
