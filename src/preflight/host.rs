//! Host inspection used by the preflight checks

use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Read-only view of the host the checks run against
pub trait HostProbe {
    /// Effective uid is 0, or the process runs under sudo
    fn is_root(&self) -> bool;

    /// `name` resolves on `PATH`
    fn has_command(&self, name: &str) -> bool;

    /// Contents of the os-release file, empty when unreadable
    fn read_os_release(&self, path: &Path) -> String;

    fn path_exists(&self, path: &Path) -> bool;

    /// The current user may write to `path`
    fn can_write(&self, path: &Path) -> bool;
}

/// [`HostProbe`] for the machine the tool runs on
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl HostProbe for SystemHost {
    fn is_root(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail.
        let euid = unsafe { libc::geteuid() };
        euid == 0 || std::env::var_os("SUDO_UID").is_some()
    }

    fn has_command(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }

    fn read_os_release(&self, path: &Path) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn can_write(&self, path: &Path) -> bool {
        let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
            return false;
        };
        // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
        unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 }
    }

}
