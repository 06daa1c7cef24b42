//! # 마크다운 문서 API 핸들러
//!
//! ## 엔드포인트
//! - `POST   /api/markdown`                → 문서 공유 (공유 링크 생성)
//! - `GET    /api/markdown/{id}`           → 문서 조회 (조회수 +1)
//! - `DELETE /api/markdown/{id}`           → 문서 삭제 (소유자만)
//! - `GET    /api/markdown/{id}/comments`  → 댓글 목록 (작성 순서)
//! - `POST   /api/markdown/{id}/comments`  → 댓글 추가
//! - `GET    /api/markdown/{id}/view`      → 줄 번호 원문 + 댓글 표시가 적용된 보기
//! - `GET    /api/user/stats`              → 현재 세션의 문서 수 / 제한
//! - `POST   /api/preview`                 → 공유 전 미리보기 렌더링
//!
//! 공유와 댓글 추가 로직은 페이지 핸들러(`routes::pages`)도 같이 사용합니다.

use crate::{
    config::Limits,
    db,
    error::AppError,
    middleware::session::Session,
    models::*,
    services::{
        lines::{LineAnchoredDocument, SourceLine},
        markdown::{render_markdown, RenderOptions},
    },
};
use axum::{
    extract::{
        rejection::JsonRejection,
        Path, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// 세션 쿠키 서명용 비밀키
    pub session_secret: String,
    /// 공유 링크 앞부분 (끝에 `/` 없음)
    pub base_url: String,
    pub limits: Limits,
    /// 뷰어와 미리보기가 같은 옵션으로 렌더링해야 줄 번호와 결과가 어긋나지 않습니다.
    pub render: RenderOptions,
}

impl AppState {
    pub fn share_url(&self, id: &str) -> String {
        format!("{}/view/{}", self.base_url, id)
    }
}

/// 문서를 검증하고 저장한 뒤 공유 링크를 돌려줍니다.
pub async fn share_markdown(
    state: &AppState,
    session: &Session,
    content: &str,
) -> Result<ShareResponse, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::BadRequest("Content cannot be empty".to_string()));
    }
    if content.len() > state.limits.max_content_bytes {
        return Err(AppError::BadRequest(format!(
            "Content too large (max {} bytes)",
            state.limits.max_content_bytes
        )));
    }

    let markdown = db::create_markdown(
        &state.pool,
        content,
        &session.owner_key(),
        &state.limits,
        Utc::now(),
    )
    .await?
    .ok_or_else(|| {
        AppError::TooManyRequests(format!(
            "rate limit exceeded: maximum {} files per user",
            state.limits.max_files_per_user
        ))
    })?;

    tracing::info!(id = %markdown.id, bytes = content.len(), "Shared markdown");

    Ok(ShareResponse {
        share_url: state.share_url(&markdown.id),
        id: markdown.id,
        expires_at: markdown.expires_at,
    })
}

/// 댓글을 검증하고 저장합니다.
///
/// 입력 검증은 저장소에 접근하기 전에 끝납니다. 빈 댓글은 DB 조회 없이 거절됩니다.
pub async fn submit_comment(
    state: &AppState,
    markdown_id: &str,
    request: &CreateCommentRequest,
) -> Result<Comment, AppError> {
    let comment = request.validate(state.limits.max_comment_chars)?;

    let now = Utc::now();
    db::get_markdown(&state.pool, markdown_id, now)
        .await?
        .ok_or(AppError::NotFound)?;

    let stored = db::add_comment(&state.pool, markdown_id, &comment, now).await?;
    tracing::info!(markdown_id, line = stored.line, "Added comment");
    Ok(stored)
}

/// `POST /api/markdown`: 새 문서를 공유합니다.
pub async fn create_markdown(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<CreateMarkdownRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShareResponse>), AppError> {
    let Json(req) = payload?;
    let share = share_markdown(&state, &session, &req.content).await?;
    Ok((StatusCode::CREATED, Json(share)))
}

/// `GET /api/markdown/{id}`: 문서를 조회합니다. 조회할 때마다 조회수가 1 늘어납니다.
pub async fn get_markdown(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<MarkdownResponse>, AppError> {
    let markdown = db::view_markdown(&state.pool, &id, Utc::now())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(markdown.into_response_for(&session.owner_key())))
}

/// `DELETE /api/markdown/{id}`: 문서와 댓글을 삭제합니다. 성공 시 204.
pub async fn delete_markdown(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    db::delete_markdown(&state.pool, &id, &session.owner_key(), Utc::now()).await?;
    tracing::info!(id = %id, "Deleted markdown");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/markdown/{id}/comments`
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    db::get_markdown(&state.pool, &id, Utc::now())
        .await?
        .ok_or(AppError::NotFound)?;
    let comments = db::list_comments(&state.pool, &id).await?;
    Ok(Json(json!({ "comments": comments })))
}

/// `POST /api/markdown/{id}/comments`
pub async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let Json(req) = payload?;
    let comment = submit_comment(&state, &id, &req).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// 댓글 표시가 적용된 문서 보기
#[derive(Debug, Serialize)]
pub struct AnnotatedDocument {
    pub id: String,
    pub html: String,
    pub lines: Vec<SourceLine>,
    /// 작성 순서 그대로의 댓글 목록
    pub comments: Vec<Comment>,
    /// 댓글이 달린 줄 번호 (중복 제거, 오름차순, 문서 범위 밖 번호 포함)
    pub annotated_lines: Vec<i64>,
}

/// `GET /api/markdown/{id}/view`: 조회수는 늘리지 않습니다.
pub async fn get_annotated_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnnotatedDocument>, AppError> {
    let markdown = db::get_markdown(&state.pool, &id, Utc::now())
        .await?
        .ok_or(AppError::NotFound)?;
    let comments = db::list_comments(&state.pool, &id).await?;

    let document = LineAnchoredDocument::new(&markdown.content);
    let (view, annotated) = document.render_annotated(&comments, &state.render);

    Ok(Json(AnnotatedDocument {
        id: markdown.id.clone(),
        html: view.html,
        lines: view.lines,
        annotated_lines: annotated.lines().collect(),
        comments,
    }))
}

/// `GET /api/user/stats`
pub async fn user_stats(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<UserStats>, AppError> {
    let files_count = db::count_user_files(&state.pool, &session.owner_key(), Utc::now()).await?;
    Ok(Json(UserStats {
        files_count,
        files_limit: state.limits.max_files_per_user,
    }))
}

/// `POST /api/preview`: 저장하지 않고 렌더링만 합니다.
pub async fn preview(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, AppError> {
    let Json(req) = payload?;
    Ok(Json(PreviewResponse {
        html: render_markdown(&req.content, &state.render),
    }))
}
