//! Tenant identity carried in access-token claims

use crate::error::{Error, Result};
use crate::flatten::number_to_string;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Serialize;
use serde_json::{Map, Value};

/// Claim flagging tokens issued to service applications
pub const EXTERNAL_APPLICATION_CLAIM: &str = "isExternalApplication";
/// Claim holding the project id
pub const PROJECT_ID_CLAIM: &str = "projectId";
/// Claim holding the company id
pub const COMPANY_ID_CLAIM: &str = "companyId";

/// Identifiers extracted from a tenant's access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantClaims {
    /// Company the credentials belong to
    pub company_id: String,
    /// Project the credentials belong to
    pub project_id: String,
}

impl TenantClaims {
    /// Extract tenant identifiers from an access token.
    ///
    /// The signature is not verified: the token was just issued to us by the
    /// API and is only read for its identifiers.
    pub fn from_token(token: &str) -> Result<Self> {
        let claims = decode_claims(token)?;

        match claims.get(EXTERNAL_APPLICATION_CLAIM) {
            Some(Value::Bool(true)) => {}
            Some(Value::Bool(false)) => {
                return Err(Error::auth("not correct client credentials"));
            }
            _ => {
                return Err(Error::invalid_token(format!(
                    "{EXTERNAL_APPLICATION_CLAIM} not found in token"
                )));
            }
        }

        Ok(Self {
            project_id: numeric_claim(&claims, PROJECT_ID_CLAIM)?,
            company_id: numeric_claim(&claims, COMPANY_ID_CLAIM)?,
        })
    }
}

/// Decode the payload of a JWT without checking its signature or expiry
pub fn decode_claims(token: &str) -> Result<Map<String, Value>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Map<String, Value>>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| Error::invalid_token(e.to_string()))?;
    Ok(data.claims)
}

fn numeric_claim(claims: &Map<String, Value>, name: &str) -> Result<String> {
    match claims.get(name) {
        Some(Value::Number(n)) => Ok(number_to_string(n)),
        _ => Err(Error::invalid_token(format!("{name} not found in token"))),
    }
}

