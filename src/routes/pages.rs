//! # 페이지 핸들러
//!
//! ## 엔드포인트
//! - `GET  /`                   → 작성 화면
//! - `POST /`                   → 미리보기(`action=preview`) 또는 공유(`action=share`)
//! - `POST /load`               → `.md` 파일을 읽어 작성 화면에 채움 (multipart)
//! - `GET  /view/{id}`          → 뷰어 (`?tab=`, `?line=`, `?goto=`, `?cancel=`, `?notice=`)
//! - `POST /view/{id}/comments` → 댓글 추가. 성공하면 뷰어로 리다이렉트
//! - `POST /view/{id}/delete`   → 문서 삭제 (소유자만). 성공하면 작성 화면으로
//! - `GET  /view/{id}/raw`      → 원문 다운로드
//!
//! 뷰어 화면 상태는 요청마다 `ViewerState`로 다시 만듭니다.

use crate::{
    db,
    error::AppError,
    middleware::session::Session,
    models::{Comment, Markdown, UserStats},
    routes::markdown::{share_markdown, submit_comment, AppState},
    services::{
        lines::LineAnchoredDocument,
        markdown::{download_filename, is_markdown_file, render_markdown},
        page::{render_composer, render_not_found, render_viewer, ComposerPage, ViewerPage},
        viewer::{CommentDraft, Notice, ViewTab, ViewerEvent, ViewerState},
    },
};
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{FormRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;

const COMMENT_ADDED: &str = "comment_added";
const DELETED: &str = "deleted";

fn not_found_page() -> Response {
    (StatusCode::NOT_FOUND, Html(render_not_found())).into_response()
}

async fn user_stats(state: &AppState, session: &Session) -> Result<UserStats, AppError> {
    let files_count = db::count_user_files(&state.pool, &session.owner_key(), Utc::now()).await?;
    Ok(UserStats {
        files_count,
        files_limit: state.limits.max_files_per_user,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ComposerQuery {
    pub notice: Option<String>,
}

/// `GET /`
pub async fn composer(
    State(state): State<AppState>,
    session: Session,
    query: Result<Query<ComposerQuery>, QueryRejection>,
) -> Result<Html<String>, AppError> {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let stats = user_stats(&state, &session).await?;
    let notice = match query.notice.as_deref() {
        Some(DELETED) => Some(Notice::success("Deleted")),
        _ => None,
    };

    Ok(Html(render_composer(&ComposerPage {
        content: "",
        preview_html: None,
        share: None,
        stats: &stats,
        notice: notice.as_ref(),
        now: Utc::now(),
    })))
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposerAction {
    #[default]
    Preview,
    Share,
}

#[derive(Debug, Deserialize)]
pub struct ComposerForm {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub action: ComposerAction,
}

/// `POST /`: 입력한 내용은 실패해도 그대로 돌려줍니다.
pub async fn submit_composer(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<ComposerForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(form) = form?;
    let preview_html = Some(render_markdown(&form.content, &state.render));

    let (status, share, notice) = match form.action {
        ComposerAction::Preview => (StatusCode::OK, None, None),
        ComposerAction::Share => match share_markdown(&state, &session, &form.content).await {
            Ok(share) => (
                StatusCode::OK,
                Some(share),
                Some(Notice::success("Link created")),
            ),
            Err(err) => (err.status(), None, Some(Notice::error(&err))),
        },
    };

    let stats = user_stats(&state, &session).await?;
    let html = render_composer(&ComposerPage {
        content: &form.content,
        preview_html,
        share: share.as_ref(),
        stats: &stats,
        notice: notice.as_ref(),
        now: Utc::now(),
    });
    Ok((status, Html(html)).into_response())
}

/// 올린 파일을 검사하고 UTF-8 문자열로 읽습니다.
fn read_markdown_file(
    file_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<String, AppError> {
    if !is_markdown_file(file_name, content_type) {
        return Err(AppError::BadRequest(
            "Please upload a markdown file (.md)".to_string(),
        ));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::BadRequest(format!(
            "Content too large (max {} bytes)",
            max_bytes
        )));
    }
    String::from_utf8(bytes.to_vec())
        .map_err(|_| AppError::BadRequest("Failed to read file".to_string()))
}

/// `POST /load`: 파일 내용을 작성 화면에 채우고 미리보기를 보여줍니다. 저장은 하지 않습니다.
pub async fn load_file(
    State(state): State<AppState>,
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart?;

    let mut loaded = Err(AppError::BadRequest(
        "Please upload a markdown file (.md)".to_string(),
    ));
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        loaded = read_markdown_file(
            &file_name,
            content_type.as_deref(),
            &bytes,
            state.limits.max_content_bytes,
        );
        break;
    }

    let (status, content, notice) = match loaded {
        Ok(content) => (
            StatusCode::OK,
            content,
            Notice::success("File loaded successfully"),
        ),
        Err(err) => (err.status(), String::new(), Notice::error(&err)),
    };

    let stats = user_stats(&state, &session).await?;
    let html = render_composer(&ComposerPage {
        content: &content,
        preview_html: Some(render_markdown(&content, &state.render)),
        share: None,
        stats: &stats,
        notice: Some(&notice),
        now: Utc::now(),
    });
    Ok((status, Html(html)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    pub tab: Option<ViewTab>,
    /// 줄 번호를 눌러 댓글 폼을 연 상태
    pub line: Option<i64>,
    /// 댓글 목록에서 고른 줄로 이동
    pub goto: Option<i64>,
    /// 댓글 폼의 Cancel: 폼을 닫고 작성 중인 내용을 버림
    pub cancel: Option<String>,
    pub notice: Option<String>,
}

impl ViewerQuery {
    /// 쿼리 없이 처음 여는 요청만 조회수에 반영합니다.
    fn is_plain_load(&self) -> bool {
        self.tab.is_none()
            && self.line.is_none()
            && self.goto.is_none()
            && self.cancel.is_none()
            && self.notice.is_none()
    }
}

fn viewer_page(
    state: &AppState,
    session: &Session,
    markdown: Markdown,
    comments: &[Comment],
    viewer: &ViewerState,
) -> String {
    let response = markdown.into_response_for(&session.owner_key());
    let share_url = state.share_url(&response.id);
    let document = LineAnchoredDocument::new(&response.content);
    let (view, _) = document.render_annotated(comments, &state.render);

    render_viewer(&ViewerPage {
        markdown: &response,
        document: &document,
        view: &view,
        comments,
        share_url: &share_url,
        state: viewer,
        now: Utc::now(),
    })
}

/// `GET /view/{id}`
///
/// 쿼리 없는 첫 조회만 조회수를 1 늘립니다. 탭 전환, 줄 선택, 이동은 같은 문서를 다시 그릴 뿐입니다.
/// 쿼리를 읽지 못하면 기본 화면에 에러 알림을 붙여 400으로 보여줍니다.
pub async fn viewer(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    query: Result<Query<ViewerQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let (query, rejected) = match query {
        Ok(Query(query)) => (query, None),
        Err(rejection) => (ViewerQuery::default(), Some(AppError::from(rejection))),
    };

    let now = Utc::now();
    let found = if rejected.is_none() && query.is_plain_load() {
        db::view_markdown(&state.pool, &id, now).await?
    } else {
        db::get_markdown(&state.pool, &id, now).await?
    };
    let Some(markdown) = found else {
        return Ok(not_found_page());
    };
    let comments = db::list_comments(&state.pool, &id).await?;

    let document = LineAnchoredDocument::new(&markdown.content);
    let mut viewer = ViewerState::default();
    if let Some(tab) = query.tab {
        viewer.apply(&document, ViewerEvent::SwitchTab(tab));
    }
    if let Some(line) = query.line {
        viewer.apply(&document, ViewerEvent::ClickLineNumber(line));
    }
    if let Some(line) = query.goto {
        viewer.apply(&document, ViewerEvent::JumpToComment(line));
    }
    if query.cancel.is_some() {
        viewer.apply(&document, ViewerEvent::CancelComment);
    }
    if query.notice.as_deref() == Some(COMMENT_ADDED) {
        viewer.apply(&document, ViewerEvent::SubmitSucceeded);
    }

    let mut status = StatusCode::OK;
    if let Some(err) = rejected {
        status = err.status();
        viewer.apply(&document, ViewerEvent::Notify(Notice::error(&err)));
    }

    let html = viewer_page(&state, &session, markdown, &comments, &viewer);
    Ok((status, Html(html)).into_response())
}

/// 댓글 폼 입력. 줄 번호도 문자열로 받아 잘못된 값이면 뷰어에 알림으로 보여줍니다.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: String,
}

/// `POST /view/{id}/comments`
///
/// 성공하면 댓글 단 줄로 이동하는 뷰어 주소로 리다이렉트하고,
/// 실패하면 폼 내용을 유지한 채 알림과 함께 뷰어를 다시 보여줍니다.
pub async fn submit_comment_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(form) = form?;
    let Some(markdown) = db::get_markdown(&state.pool, &id, Utc::now()).await? else {
        return Ok(not_found_page());
    };

    let document = LineAnchoredDocument::new(&markdown.content);
    let mut viewer = ViewerState::default();
    match form.line.trim().parse::<i64>() {
        Ok(line) => {
            viewer.apply(&document, ViewerEvent::ClickLineNumber(line));
        }
        Err(_) => {
            let err = AppError::BadRequest("Line number must be positive".to_string());
            viewer.apply(&document, ViewerEvent::Notify(Notice::error(&err)));
        }
    }
    viewer.apply(
        &document,
        ViewerEvent::EditDraft(CommentDraft {
            author: form.author,
            text: form.text,
        }),
    );

    let mut status = StatusCode::BAD_REQUEST;
    if viewer.apply(&document, ViewerEvent::SubmitStarted) {
        let request = viewer
            .comment_request()
            .ok_or_else(|| AppError::Internal("comment form closed while submitting".to_string()))?;

        match submit_comment(&state, &id, &request).await {
            Ok(comment) => {
                let line = comment.line;
                return Ok(Redirect::to(&format!(
                    "/view/{}?tab=source&goto={}&notice={}#L{}",
                    id, line, COMMENT_ADDED, line
                ))
                .into_response());
            }
            Err(err) => {
                status = err.status();
                viewer.apply(&document, ViewerEvent::SubmitFailed(err));
            }
        }
    }

    let comments = db::list_comments(&state.pool, &id).await?;
    let html = viewer_page(&state, &session, markdown, &comments, &viewer);
    Ok((status, Html(html)).into_response())
}

/// `POST /view/{id}/delete`
pub async fn delete_from_viewer(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let now = Utc::now();
    match db::delete_markdown(&state.pool, &id, &session.owner_key(), now).await {
        Ok(()) => {
            tracing::info!(id = %id, "Deleted markdown");
            Ok(Redirect::to(&format!("/?notice={}", DELETED)).into_response())
        }
        Err(AppError::NotFound) => Ok(not_found_page()),
        Err(err) => {
            let Some(markdown) = db::get_markdown(&state.pool, &id, now).await? else {
                return Ok(not_found_page());
            };
            let comments = db::list_comments(&state.pool, &id).await?;

            let status = err.status();
            let document = LineAnchoredDocument::new(&markdown.content);
            let mut viewer = ViewerState::default();
            viewer.apply(&document, ViewerEvent::Notify(Notice::error(&err)));

            let html = viewer_page(&state, &session, markdown, &comments, &viewer);
            Ok((status, Html(html)).into_response())
        }
    }
}

/// `GET /view/{id}/raw`: 조회수는 늘리지 않습니다.
pub async fn download_raw(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(markdown) = db::get_markdown(&state.pool, &id, Utc::now()).await? else {
        return Ok(not_found_page());
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        download_filename(&markdown.content)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        markdown.content,
    )
        .into_response())
}
