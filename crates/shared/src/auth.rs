//! Authentication claim types.
//!
//! Token issuance lives in the identity service; this backend only validates
//! bearer tokens minted there.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (employee id).
    pub sub: i64,
    /// The employee's directory role (employee, hr, admin).
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for an employee.
    #[must_use]
    pub fn new(user_id: i64, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the employee id from claims.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_roundtrip() {
        let claims = Claims::new(42, "hr", Utc::now() + Duration::minutes(15));
        assert_eq!(claims.user_id(), 42);
        assert_eq!(claims.role, "hr");
        assert!(claims.exp > claims.iat);
    }
}
