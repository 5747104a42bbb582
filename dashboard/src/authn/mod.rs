//! Authentication gate for operations
//!
//! Session handling lives in the embedding UI; operations only ask whether
//! the caller is signed in.

use crate::errors::DashboardError;

/// "Is the caller authenticated" predicate
pub trait AuthGate: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Fail with `AuthRequired` unless authenticated
    fn require(&self, action: &str) -> Result<(), DashboardError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(DashboardError::AuthRequired(format!(
                "sign in to {}",
                action
            )))
        }
    }
}

impl AuthGate for bool {
    fn is_authenticated(&self) -> bool {
        *self
    }
}

impl<F> AuthGate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_authenticated(&self) -> bool {
        self()
    }
}
