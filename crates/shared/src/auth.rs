//! Authentication types for JWT claims.
//!
//! Token issuance lives outside this service; these types cover what the
//! API needs to read an already-issued identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role names carried in token claims.
pub const ROLE_ADMIN: &str = "admin";
/// Default role for point-of-sale operators.
pub const ROLE_CASHIER: &str = "cashier";

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User's role.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns true if the claims carry the administrator role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_roundtrip_fields() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, ROLE_ADMIN, Utc::now() + Duration::minutes(15));

        assert_eq!(claims.user_id(), user_id);
        assert!(claims.is_admin());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_cashier_is_not_admin() {
        let claims = Claims::new(
            Uuid::new_v4(),
            ROLE_CASHIER,
            Utc::now() + Duration::minutes(15),
        );
        assert!(!claims.is_admin());
    }
}
