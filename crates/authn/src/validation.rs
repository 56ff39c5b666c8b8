//! JWT algorithm validation.
//!
//! Identity tokens from the trust authority are RSA-signed. Only the
//! algorithms the verifier fully implements are accepted; symmetric
//! algorithms and `none` are always rejected, whatever the configuration.

use jsonwebtoken::Algorithm;

use crate::error::AuthError;

/// Forbidden JWT algorithms that are never accepted.
///
/// - `none`: No signature verification (trivially bypassable)
/// - `HS256`, `HS384`, `HS512`: Symmetric algorithms (shared secret vulnerability)
pub const FORBIDDEN_ALGORITHMS: &[&str] = &["none", "HS256", "HS384", "HS512"];

/// Accepted JWT algorithms.
///
/// Per RFC 8725 Section 3.1, validators must reject algorithms they do not
/// fully implement. Key material is published as RSA JWKs, so only RSA
/// PKCS#1 v1.5 signatures are listed.
pub const ACCEPTED_ALGORITHMS: &[&str] = &["RS256", "RS384", "RS512"];

/// Validate a JWT algorithm name against security policy.
///
/// # Errors
///
/// Returns [`AuthError::UnsupportedAlgorithm`] if:
/// - Algorithm is symmetric (HS256, HS384, HS512)
/// - Algorithm is "none"
/// - Algorithm is not in [`ACCEPTED_ALGORITHMS`]
///
/// # Examples
///
/// ```
/// use mediagate_authn::validation::validate_algorithm;
///
/// assert!(validate_algorithm("RS256").is_ok());
/// assert!(validate_algorithm("HS256").is_err());
/// assert!(validate_algorithm("EdDSA").is_err());
/// ```
pub fn validate_algorithm(alg: &str) -> Result<(), AuthError> {
    if FORBIDDEN_ALGORITHMS.contains(&alg) {
        return Err(AuthError::UnsupportedAlgorithm(format!(
            "Algorithm '{}' is not allowed for security reasons",
            alg
        )));
    }

    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(AuthError::UnsupportedAlgorithm(format!(
            "Algorithm '{}' is not in accepted list (only RSA signatures are supported)",
            alg
        )));
    }

    Ok(())
}

/// Canonical name for an [`Algorithm`] (as it appears in a JWT header).
#[must_use]
pub fn algorithm_name(alg: Algorithm) -> String {
    format!("{alg:?}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("RS256")]
    #[case("RS384")]
    #[case("RS512")]
    fn test_rsa_algorithms_accepted(#[case] alg: &str) {
        assert!(validate_algorithm(alg).is_ok());
    }

    #[test]
    fn test_validate_algorithm_none_rejected() {
        let result = validate_algorithm("none");
        assert!(
            matches!(result, Err(AuthError::UnsupportedAlgorithm(ref msg)) if msg.contains("not allowed for security reasons"))
        );
    }

    #[test]
    fn test_forbidden_algorithms_each_rejected_with_security_message() {
        for alg in FORBIDDEN_ALGORITHMS {
            let result = validate_algorithm(alg);
            assert!(
                matches!(result, Err(AuthError::UnsupportedAlgorithm(ref msg)) if msg.contains("not allowed for security reasons")),
                "Expected security rejection for forbidden algorithm '{alg}'"
            );
        }
    }

    #[rstest]
    #[case("EdDSA")]
    #[case("ES256")]
    #[case("PS256")]
    fn test_unimplemented_algorithms_rejected(#[case] alg: &str) {
        let result = validate_algorithm(alg);
        assert!(
            matches!(result, Err(AuthError::UnsupportedAlgorithm(ref msg)) if msg.contains("not in accepted list"))
        );
    }

    #[rstest]
    #[case(Algorithm::RS256, "RS256")]
    #[case(Algorithm::RS512, "RS512")]
    fn test_algorithm_name_matches_header_spelling(#[case] alg: Algorithm, #[case] name: &str) {
        assert_eq!(algorithm_name(alg), name);
        assert!(validate_algorithm(&algorithm_name(alg)).is_ok());
    }
}
