//! Credential checks run before the first turn.

use crate::ports::CredentialValidator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCheck {
    pub name: String,
    pub valid: bool,
}

/// Validate each key with its validator, in order. Blank keys are invalid
/// without a network call.
pub async fn check_credentials(
    checks: &[(&dyn CredentialValidator, &str)],
) -> Vec<CredentialCheck> {
    let mut results = Vec::with_capacity(checks.len());
    for (validator, key) in checks {
        let valid = !key.trim().is_empty() && validator.is_valid(key).await;
        if !valid {
            log::warn!("{} failed validation", validator.credential_name());
        }
        results.push(CredentialCheck {
            name: validator.credential_name().to_string(),
            valid,
        });
    }
    results
}

pub fn all_valid(results: &[CredentialCheck]) -> bool {
    results.iter().all(|c| c.valid)
}
