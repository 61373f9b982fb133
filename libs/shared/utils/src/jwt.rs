use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared_models::auth::{JwtClaims, User};
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    // Decode claims
    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    // Check expiration
    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let created_at = claims
        .iat
        .map(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        role: claims.role,
        patient_id: claims.patient_id,
        dentist_id: claims.dentist_id,
        created_at: created_at.flatten(),
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_token(claims_json: &str, secret: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(claims_json.as_bytes());
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", header, claims).as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}.{}", header, claims, signature)
    }

    #[test]
    fn accepts_valid_token_and_maps_claims() {
        let token = sign_token(
            r#"{"sub":"user-1","role":"dentist","dentist_id":7}"#,
            "test-secret",
        );
        let user = validate_token(&token, "test-secret").unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.role.as_deref(), Some("dentist"));
        assert_eq!(user.dentist_id, Some(7));
        assert_eq!(user.patient_id, None);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign_token(r#"{"sub":"user-1"}"#, "test-secret");
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign_token(r#"{"sub":"user-1","exp":1000000}"#, "test-secret");
        assert_eq!(
            validate_token(&token, "test-secret").unwrap_err(),
            "Token expired"
        );
    }

    #[test]
    fn rejects_malformed_token() {
        assert!(validate_token("not-a-jwt", "test-secret").is_err());
        assert!(validate_token("a.b", "test-secret").is_err());
    }
}
