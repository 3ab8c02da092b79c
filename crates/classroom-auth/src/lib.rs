//! # Classroom Auth
//!
//! Authentication types and JWT utilities for the Classroom API.
//!
//! - [`claims`]: Token claims and the [`Role`] of the signed-in account
//! - [`jwt`]: Token creation and verification
//!
//! Every successful registration or login yields an access token and a
//! refresh token; the refresh token embeds the access token it was issued with.

pub mod claims;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims, Role, TokenType};
pub use jwt::{
    create_access_token, create_refresh_token, issue_token_pair, verify_refresh_token,
    verify_token,
};
