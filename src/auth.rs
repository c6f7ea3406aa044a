use tracing::{info, warn};

use crate::error::{CatalogError, Result};

/// Proof that the holder passed the admin credential check.
///
/// Only [`AdminGate::sign_in`] can make one; write operations take it by
/// reference.
#[derive(Debug)]
pub struct Capability {
    _sealed: (),
}

/// Shared-secret check guarding the write path.
pub struct AdminGate {
    password: Option<String>,
}

impl AdminGate {
    pub fn new(password: Option<String>) -> Self {
        AdminGate {
            password: password.filter(|p| !p.is_empty()),
        }
    }

    pub fn sign_in(&self, attempt: &str) -> Result<Capability> {
        match &self.password {
            Some(expected) if expected == attempt => {
                info!("Admin signed in");
                Ok(Capability { _sealed: () })
            }
            Some(_) => {
                warn!("Rejected admin password");
                Err(CatalogError::AccessDenied)
            }
            None => {
                warn!("No admin password configured; write access disabled");
                Err(CatalogError::AccessDenied)
            }
        }
    }
}

#[cfg(test)]
pub fn test_capability() -> Capability {
    Capability { _sealed: () }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_password_grants_capability() {
        let gate = AdminGate::new(Some("ladhowal".into()));
        assert!(gate.sign_in("ladhowal").is_ok());
    }

    #[test]
    fn wrong_password_is_denied() {
        let gate = AdminGate::new(Some("ladhowal".into()));
        assert!(matches!(gate.sign_in("Ladhowal"), Err(CatalogError::AccessDenied)));
        assert!(matches!(gate.sign_in(""), Err(CatalogError::AccessDenied)));
    }

    #[test]
    fn unset_or_empty_password_denies_everyone() {
        assert!(AdminGate::new(None).sign_in("").is_err());
        assert!(AdminGate::new(Some(String::new())).sign_in("").is_err());
    }
}
