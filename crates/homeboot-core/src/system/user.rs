//! Target user resolution
//!
//! Generated files and schedule entries belong to a target account that may
//! differ from the invoking one (`sudo homeboot ...`).

use nix::unistd::{Gid, Uid, User};
use std::path::{Path, PathBuf};

use crate::Error;

/// Account that owns the generated files and the scheduled task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUser {
    /// Login name
    pub name: String,
    /// Numeric user id
    pub uid: u32,
    /// Primary group id
    pub gid: u32,
    /// Home directory
    pub home: PathBuf,
}

impl TargetUser {
    /// Look up an account by login name
    pub fn lookup(name: &str) -> Result<Self, Error> {
        let user = User::from_name(name)
            .map_err(|e| Error::validation(format!("failed to look up user '{}': {}", name, e)))?
            .ok_or_else(|| Error::validation(format!("user '{}' does not exist", name)))?;
        Ok(Self::from(user))
    }

    /// The account this process runs as
    pub fn current() -> Result<Self, Error> {
        let uid = nix::unistd::geteuid();
        let user = User::from_uid(uid)
            .map_err(|e| Error::validation(format!("failed to look up uid {}: {}", uid, e)))?
            .ok_or_else(|| Error::validation(format!("uid {} has no passwd entry", uid)))?;
        Ok(Self::from(user))
    }

    /// Whether this process runs as the target account
    pub fn is_current(&self) -> bool {
        nix::unistd::geteuid().as_raw() == self.uid
    }

    /// Give `path` to the target account when running as someone else
    ///
    /// Only root can do this; for other callers the file already belongs to
    /// the invoking account and is left alone.
    pub fn take_ownership(&self, path: &Path) -> Result<(), Error> {
        if self.is_current() || !nix::unistd::geteuid().is_root() {
            return Ok(());
        }

        nix::unistd::chown(
            path,
            Some(Uid::from_raw(self.uid)),
            Some(Gid::from_raw(self.gid)),
        )
        .map_err(|e| {
            Error::permission(format!(
                "failed to chown {} to {}: {}",
                path.display(),
                self.name,
                e
            ))
        })
    }
}

impl From<User> for TargetUser {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            home: user.dir,
        }
    }
}

/// Pick the target account name
///
/// Order: explicit `--user`, then the account that invoked `sudo`, then the
/// current account. Blank values are skipped.
pub fn target_user_name(explicit: Option<&str>, sudo_user: Option<&str>) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| sudo_user.map(str::trim).filter(|s| !s.is_empty()))
        .map(str::to_string)
}

/// Resolve the target account
///
/// # Errors
///
/// `Error::Validation` when the named account does not exist.
pub fn resolve_target_user(
    explicit: Option<&str>,
    sudo_user: Option<&str>,
) -> Result<TargetUser, Error> {
    match target_user_name(explicit, sudo_user) {
        Some(name) => TargetUser::lookup(&name),
        None => TargetUser::current(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_user_wins() {
        assert_eq!(
            target_user_name(Some("farmer"), Some("admin")),
            Some("farmer".to_string())
        );
        assert_eq!(
            target_user_name(Some("  "), Some("admin")),
            Some("admin".to_string())
        );
        assert_eq!(target_user_name(None, None), None);
    }

    #[test]
    fn unknown_user_is_a_validation_error() {
        let err = resolve_target_user(Some("no-such-user-homeboot-test"), None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn current_user_resolves() {
        let user = resolve_target_user(None, None).unwrap();
        assert!(user.is_current());
    }
}
