//! Authentication module
//!
//! Reads the tenant identity (company and project) out of the access token
//! issued for a set of client credentials. Token issuance itself lives with
//! the inventory client.

mod claims;

pub use claims::{
    decode_claims, TenantClaims, COMPANY_ID_CLAIM, EXTERNAL_APPLICATION_CLAIM, PROJECT_ID_CLAIM,
};
