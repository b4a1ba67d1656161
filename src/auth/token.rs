//! Bearer token issuing and resolution.
//!
//! The token is a signed JWT whose subject is the user's database ID. The
//! subject travels as a string and is parsed back into a [UserID] exactly
//! once, when the token is resolved; a non-numeric subject is treated as an
//! invalid token rather than a server error.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

/// How long an issued token stays valid.
pub const TOKEN_DURATION: Duration = Duration::hours(24);

/// The claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user ID as a string.
    pub sub: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
    /// Issued-at as a unix timestamp.
    pub iat: i64,
}

/// Issue a signed token for `user_id` that expires after [TOKEN_DURATION].
///
/// # Errors
///
/// Returns [Error::TokenCreation] if signing fails.
pub fn issue_token(user_id: UserID, encoding_key: &EncodingKey) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + TOKEN_DURATION).unix_timestamp(),
        iat: now.unix_timestamp(),
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Resolve a token string into the user ID it was issued for.
///
/// # Errors
///
/// Returns [Error::ExpiredToken] for a token past its expiry, and
/// [Error::InvalidToken] for anything else that fails: a bad signature, a
/// malformed token, or a subject that does not parse as a user ID.
pub fn resolve_token(token: &str, decoding_key: &DecodingKey) -> Result<UserID, Error> {
    let token_data = decode::<Claims>(token, decoding_key, &Validation::default()).map_err(
        |error| match error.kind() {
            ErrorKind::ExpiredSignature => Error::ExpiredToken,
            _ => Error::InvalidToken,
        },
    )?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map(UserID::new)
        .map_err(|_| Error::InvalidToken)
}

#[cfg(test)]
mod token_tests {
    use jsonwebtoken::{DecodingKey, EncodingKey, Header, encode};
    use time::OffsetDateTime;

    use crate::{Error, user::UserID};

    use super::{Claims, issue_token, resolve_token};

    fn get_keys() -> (EncodingKey, DecodingKey) {
        let secret = b"a test secret";
        (
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
        )
    }

    #[test]
    fn issued_token_round_trips() {
        let (encoding_key, decoding_key) = get_keys();
        let user_id = UserID::new(42);

        let token = issue_token(user_id, &encoding_key).expect("Could not issue token");
        let resolved = resolve_token(&token, &decoding_key);

        assert_eq!(resolved, Ok(user_id));
    }

    #[test]
    fn expired_token_is_rejected() {
        let (encoding_key, decoding_key) = get_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: "1".to_owned(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(&Header::default(), &claims, &encoding_key)
            .expect("Could not encode token");

        let resolved = resolve_token(&token, &decoding_key);

        assert_eq!(resolved, Err(Error::ExpiredToken));
    }

    #[test]
    fn token_signed_with_another_key_is_rejected() {
        let (encoding_key, _) = get_keys();
        let other_decoding_key = DecodingKey::from_secret(b"a different secret");

        let token = issue_token(UserID::new(1), &encoding_key).expect("Could not issue token");
        let resolved = resolve_token(&token, &other_decoding_key);

        assert_eq!(resolved, Err(Error::InvalidToken));
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        let (encoding_key, decoding_key) = get_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: "not-a-number".to_owned(),
            exp: now + 3600,
            iat: now,
        };
        let token = encode(&Header::default(), &claims, &encoding_key)
            .expect("Could not encode token");

        let resolved = resolve_token(&token, &decoding_key);

        assert_eq!(resolved, Err(Error::InvalidToken));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let (_, decoding_key) = get_keys();

        let resolved = resolve_token("definitely.not.ajwt", &decoding_key);

        assert_eq!(resolved, Err(Error::InvalidToken));
    }
}
