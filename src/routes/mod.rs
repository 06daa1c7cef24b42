//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들과 라우터 구성을 모아둔 모듈입니다.
//!
//! 각 하위 모듈:
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `markdown`: JSON API (문서 공유/조회/삭제, 댓글, 미리보기, 사용량)
//! - `pages`: 서버 렌더링 페이지 (작성 화면, 뷰어)

pub mod health;
pub mod markdown;
pub mod pages;

pub use health::*;
pub use markdown::*;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::middleware::session::ensure_session;

/// 전체 라우터를 만듭니다.
///
/// 모든 요청은 세션 미들웨어를 거치므로 핸들러는 항상 `Session`을 추출할 수 있습니다.
pub fn router(state: AppState, static_dir: &str) -> Router {
    let api_routes = Router::new()
        .route("/markdown", post(create_markdown))
        .route("/markdown/{id}", get(get_markdown).delete(delete_markdown))
        .route("/markdown/{id}/comments", get(list_comments).post(create_comment))
        .route("/markdown/{id}/view", get(get_annotated_view))
        .route("/user/stats", get(user_stats))
        .route("/preview", post(preview));

    let page_routes = Router::new()
        .route("/", get(pages::composer).post(pages::submit_composer))
        .route("/load", post(pages::load_file))
        .route("/view/{id}", get(pages::viewer))
        .route("/view/{id}/comments", post(pages::submit_comment_form))
        .route("/view/{id}/delete", post(pages::delete_from_viewer))
        .route("/view/{id}/raw", get(pages::download_raw));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        .merge(page_routes)
        .route("/health", get(health_check))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(from_fn_with_state(state.clone(), ensure_session))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
