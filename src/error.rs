//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `ErrorKind`: 사용자에게 보여줄 알림을 고르기 위한 다섯 가지 분류
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// 사용자에게 노출되는 에러 분류
///
/// 페이지의 알림(notice)과 JSON 응답의 `kind` 필드가 이 값을 사용합니다.
/// 세부 원인은 로그에만 남고, 사용자는 이 분류와 짧은 메시지만 보게 됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 빈 문서 공유, 빈 댓글, 잘못된 줄 번호 등 입력 문제
    InvalidInput,
    /// 문서가 없거나 만료/삭제됨
    NotFound,
    /// 소유자가 아닌 세션의 삭제 시도 등 권한 문제
    Unauthorized,
    /// 저장소에 닿지 못함 (연결 풀 고갈, 연결 끊김 등)
    TransportFailure,
    /// 그 밖의 모든 실패
    Unknown,
}

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 각 에러 variant는 적절한 HTTP 상태 코드와 메시지로 변환됩니다.
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 요청 (HTTP 400)
    /// {0}은 첫 번째 필드(String)를 참조하는 포맷 문법입니다.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 세션이 없거나 유효하지 않음 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 세션은 있지만 권한이 없음 (HTTP 403). 예: 남의 문서 삭제
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 세션당 문서 수 제한 초과 (HTTP 429)
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx 함수의 에러에 `?`를 쓰면 자동으로 AppError::Database로 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// 이 에러가 사용자에게 어떤 분류로 보일지 결정합니다.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::BadRequest(_) | AppError::TooManyRequests(_) => ErrorKind::InvalidInput,
            AppError::NotFound => ErrorKind::NotFound,
            AppError::Unauthorized(_) | AppError::Forbidden(_) => ErrorKind::Unauthorized,
            // 연결 자체를 얻지 못한 경우만 전송 실패로 봅니다.
            AppError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_),
            ) => ErrorKind::TransportFailure,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::Unknown,
        }
    }

    /// 사용자에게 보여줄 메시지
    ///
    /// 내부 에러(Database, Internal)는 실제 내용을 로그에만 기록하고,
    /// 사용자에게는 일반적인 메시지만 반환합니다.
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotFound => self.to_string(),
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::TooManyRequests(msg) => msg.clone(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                match self.kind() {
                    ErrorKind::TransportFailure => "Storage is unreachable, try again".to_string(),
                    _ => "A database error occurred".to_string(),
                }
            }
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::TooManyRequests(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Database(_) => match self.kind() {
                ErrorKind::TransportFailure => (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
        }
    }

    /// 페이지 응답에서도 같은 상태 코드를 쓰기 위해 공개합니다.
    pub fn status(&self) -> StatusCode {
        self.status_and_code().0
    }
}

// 추출기(extractor) 거부도 모두 400 BadRequest로 바꿔 같은 에러 본문을 쓰게 합니다.
// axum 기본 응답(422 + 평문)은 세부 내용만 로그에 남깁니다.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        AppError::BadRequest("Invalid request body".to_string())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        tracing::debug!("Rejected form body: {}", rejection.body_text());
        AppError::BadRequest("Invalid form data".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        AppError::BadRequest("Invalid query parameters".to_string())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!("Rejected multipart body: {}", rejection.body_text());
        AppError::BadRequest("Invalid file upload".to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        tracing::debug!("Failed to read multipart body: {}", err.body_text());
        AppError::BadRequest("Invalid file upload".to_string())
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 결과: `{ "error": { "code": "not_found", "kind": "not_found", "message": "..." } }`
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = Json(json!({
            "error": {
                "code": code,
                "kind": self.kind(),
                "message": self.public_message()
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_user_visible_categories() {
        assert_eq!(AppError::BadRequest("empty".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(AppError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(AppError::Forbidden("nope".into()).kind(), ErrorKind::Unauthorized);
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::TransportFailure
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Unknown
        );
        assert_eq!(AppError::Internal("boom".into()).kind(), ErrorKind::Unknown);
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = AppError::Internal("secret path /var/db".into());
        assert_eq!(err.public_message(), "An internal error occurred");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn quota_errors_map_to_429() {
        let err = AppError::TooManyRequests("limit".into());
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.public_message(), "limit");
    }
}
