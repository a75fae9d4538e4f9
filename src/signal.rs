//! A scoped guard that ignores `SIGINT`/`SIGTERM` for as long as it's held,
//! restoring whatever disposition was previously in effect on every exit
//! path (including unwinding). Used to bracket the window during which a
//! `LocalDirectory` holds a CVS-style lock, so that an aborted process can
//! never leave `#cvs.lock`/`#cvs.rfl*`/`#cvs.wfl*` behind.

use std::io;
use std::mem::MaybeUninit;

pub struct MaskedSignals {
    old_int: libc::sigaction,
    old_term: libc::sigaction,
}

impl MaskedSignals {
    pub fn new() -> io::Result<Self> {
        unsafe {
            let mut ignore: libc::sigaction = std::mem::zeroed();
            ignore.sa_sigaction = libc::SIG_IGN;
            libc::sigemptyset(&mut ignore.sa_mask);

            let old_int = set(libc::SIGINT, &ignore)?;
            let old_term = match set(libc::SIGTERM, &ignore) {
                Ok(old) => old,
                Err(e) => {
                    // Best effort: restore SIGINT before bailing out.
                    let _ = restore(libc::SIGINT, &old_int);
                    return Err(e);
                }
            };

            Ok(Self { old_int, old_term })
        }
    }
}

impl Drop for MaskedSignals {
    fn drop(&mut self) {
        let _ = restore(libc::SIGINT, &self.old_int);
        let _ = restore(libc::SIGTERM, &self.old_term);
    }
}

unsafe fn set(signum: i32, action: &libc::sigaction) -> io::Result<libc::sigaction> {
    let mut old = MaybeUninit::uninit();
    if libc::sigaction(signum, action, old.as_mut_ptr()) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(old.assume_init())
}

unsafe fn restore(signum: i32, action: &libc::sigaction) -> io::Result<()> {
    if libc::sigaction(signum, action, std::ptr::null_mut()) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
