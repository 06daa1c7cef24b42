use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::routes::AppState;

pub const SESSION_COOKIE: &str = "mdspace_session";
pub const SESSION_MAX_AGE_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // session id
    pub exp: i64,
    pub iat: i64,
}

/// 요청을 보낸 브라우저 세션
///
/// 계정 없이 쿠키 하나로 문서 소유자를 구분합니다.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
}

impl Session {
    /// DB의 `owner_id`와 비교하는 키. 세션 ID 원문은 저장하지 않습니다.
    pub fn owner_key(&self) -> String {
        hash_token(&self.session_id)
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Session is required".to_string()))
    }
}

/// 모든 요청에 세션을 붙이는 미들웨어
///
/// 쿠키가 없거나, 서명이 틀리거나, 만료되었으면 새 세션을 만들어 `Set-Cookie`로 내려줍니다.
pub async fn ensure_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = cookie_value(request.headers(), SESSION_COOKIE)
        .and_then(|token| verify_session_token(&token, &state.session_secret).ok());

    let (session, issued) = match existing {
        Some(claims) => (Session { session_id: claims.sub }, None),
        None => {
            let session_id = uuid::Uuid::now_v7().to_string();
            match create_session_token(&session_id, &state.session_secret) {
                Ok(token) => {
                    tracing::debug!("Issued new session");
                    (Session { session_id }, Some(token))
                }
                Err(e) => {
                    return AppError::Internal(format!("Failed to sign session: {}", e))
                        .into_response()
                }
            }
        }
    };

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;

    if let Some(token) = issued {
        match HeaderValue::from_str(&session_cookie(&token)) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Invalid session cookie header: {}", e),
        }
    }

    response
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        token,
        SESSION_MAX_AGE_HOURS * 60 * 60
    )
}

/// `Cookie` 헤더들에서 이름이 `name`인 값을 찾습니다.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn create_session_token(
    session_id: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: session_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(SESSION_MAX_AGE_HOURS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_session_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Session has expired".to_string())
        }
        _ => AppError::Unauthorized("Invalid session".to_string()),
    })?;

    Ok(token_data.claims)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_round_trips() {
        let token = create_session_token("abc", "secret").unwrap();
        let claims = verify_session_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "abc");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_session_token("abc", "secret").unwrap();
        assert!(verify_session_token(&token, "other").is_err());
        assert!(verify_session_token("garbage", "secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let past = Utc::now() - Duration::hours(48);
        let claims = Claims {
            sub: "abc".to_string(),
            iat: past.timestamp(),
            exp: (past + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(verify_session_token(&token, "secret").is_err());
    }

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; mdspace_session=tok"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(cookie_value(&headers, SESSION_COOKIE).as_deref(), Some("tok"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_value_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("mdspace_session="));
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), None);
    }

    #[test]
    fn owner_key_is_stable_hash() {
        let session = Session { session_id: "abc".to_string() };
        assert_eq!(session.owner_key(), hash_token("abc"));
        assert_eq!(session.owner_key().len(), 64);
        assert_ne!(session.owner_key(), "abc");
    }
}
