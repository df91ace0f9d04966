//! Credentials cached for the lifetime of one invocation

use crate::logging::SECRET_PLACEHOLDER;

/// Passwords the operator entered during this run
///
/// Nothing here is persisted. [`Session::clear`], also run on drop, zeroes
/// the buffers this session owns. Copies callers already took are theirs.
#[derive(Default)]
pub struct Session {
    db_root_password: Option<String>,
    sudo_password: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn db_root_password(&self) -> Option<&str> {
        self.db_root_password.as_deref()
    }

    pub fn set_db_root_password(&mut self, password: impl Into<String>) {
        self.db_root_password = Some(password.into());
    }

    pub fn sudo_password(&self) -> Option<&str> {
        self.sudo_password.as_deref()
    }

    pub fn set_sudo_password(&mut self, password: impl Into<String>) {
        self.sudo_password = Some(password.into());
    }

    /// Forget every cached credential
    pub fn clear(&mut self) {
        for slot in [&mut self.db_root_password, &mut self.sudo_password] {
            if let Some(mut secret) = slot.take() {
                // Only the current buffer; clones and earlier reallocations keep their bytes.
                secret.replace_range(.., &"\0".repeat(secret.len()));
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("db_root_password", &self.db_root_password.as_ref().map(|_| SECRET_PLACEHOLDER))
            .field("sudo_password", &self.sudo_password.as_ref().map(|_| SECRET_PLACEHOLDER))
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.clear();
    }
}
