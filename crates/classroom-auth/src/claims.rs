//! JWT claim structures for authentication tokens.
//!
//! - [`Claims`]: Access token claims
//! - [`RefreshTokenClaims`]: Refresh token claims, carrying the access token they were issued with

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The two kinds of account that can sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distinguishes access from refresh tokens signed with the same secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Account ID (subject claim)
    pub sub: String,
    pub role: Role,
    pub typ: TokenType,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub role: Role,
    pub typ: TokenType,
    /// The access token issued alongside this refresh token
    pub access_token: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique token identifier (JWT ID)
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), r#""student""#);
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), r#""teacher""#);
        assert_eq!(Role::Teacher.to_string(), "teacher");
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":"user-id-456","role":"teacher","typ":"access","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "user-id-456");
        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(claims.exp, 9999999999);
        assert_eq!(claims.typ, TokenType::Access);
    }

    #[test]
    fn test_claims_without_type_rejected() {
        let json = r#"{"sub":"x","role":"student","exp":1,"iat":1}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let json = r#"{"sub":"x","role":"admin","typ":"access","exp":1,"iat":1}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }

    #[test]
    fn test_refresh_claims_serialize() {
        let claims = RefreshTokenClaims {
            sub: "user-123".to_string(),
            role: Role::Student,
            typ: TokenType::Refresh,
            access_token: "access".to_string(),
            exp: 1234567890,
            iat: 1234567800,
            jti: "test-jti-123".to_string(),
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""access_token":"access""#));
        assert!(serialized.contains(r#""role":"student""#));
        assert!(serialized.contains(r#""typ":"refresh""#));
    }
}
