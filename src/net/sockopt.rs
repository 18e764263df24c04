//! Raw `setsockopt(2)` / `getsockopt(2)` on table entries.

use std::io;
use std::mem::size_of;
use std::os::fd::{AsRawFd, BorrowedFd};

use libc::{c_int, c_void, socklen_t};

use super::platform::Sockopt;
use super::Error;

/// Set an integer option.
pub fn set_int(fd: BorrowedFd<'_>, opt: &Sockopt, value: c_int) -> Result<(), Error> {
    let result = unsafe {
        libc::setsockopt(
            fd.as_raw_fd(),
            opt.level,
            opt.name,
            &value as *const c_int as *const c_void,
            size_of::<c_int>() as socklen_t,
        )
    };

    if result == -1 {
        Err(Error::syscall(
            "setsockopt",
            opt.label,
            io::Error::last_os_error(),
        ))
    } else {
        Ok(())
    }
}

/// Read an integer option.
pub fn get_int(fd: BorrowedFd<'_>, opt: &Sockopt) -> Result<c_int, Error> {
    let mut value: c_int = 0;
    let mut len = size_of::<c_int>() as socklen_t;

    let result = unsafe {
        libc::getsockopt(
            fd.as_raw_fd(),
            opt.level,
            opt.name,
            &mut value as *mut c_int as *mut c_void,
            &mut len,
        )
    };

    if result == -1 {
        Err(Error::syscall(
            "getsockopt",
            opt.label,
            io::Error::last_os_error(),
        ))
    } else {
        Ok(value)
    }
}
