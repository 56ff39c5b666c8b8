//! Fuzz target for credential and token parsing.
//!
//! Feeds arbitrary byte strings as `Authorization` header values. Every
//! result must be either `Ok(...)`/`Some(...)` or an error/`None`; no input
//! may panic or hang.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mediagate_authn::jwt::{
    decode_jwt_header, decode_unverified_claims, extract_bearer_token, validate_identity_claims,
};

fuzz_target!(|data: &[u8]| {
    // Header values reaching the verifier are always valid UTF-8
    let Ok(credential) = std::str::from_utf8(data) else {
        return;
    };

    let token = extract_bearer_token(credential).unwrap_or(credential);

    if let Ok(header) = decode_jwt_header(token) {
        let _ = mediagate_authn::validate_algorithm(&format!("{:?}", header.alg));
    }

    if let Ok(claims) = decode_unverified_claims(token) {
        // Boundary instants for the freshness checks
        let _ = validate_identity_claims(&claims, 0);
        let _ = validate_identity_claims(&claims, i64::MAX);
        let _ = validate_identity_claims(&claims, i64::MIN);
        if let Some(iat) = claims.iat {
            let _ = validate_identity_claims(&claims, (iat * 1_000.0) as i64);
        }
    }
});
