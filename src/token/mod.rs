//! Session token decoding.

pub mod jwt;

pub use jwt::{Claims, TokenError, decode_claims, decode_expiry};
