//! 테스트 공용 헬퍼: 마이그레이션된 인메모리 DB와 AppState

use crate::config::Limits;
use crate::routes::AppState;
use crate::services::markdown::RenderOptions;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub const TEST_SECRET: &str = "test-session-secret";

/// 테스트마다 새로 만드는 인메모리 SQLite 풀
///
/// `sqlite::memory:`는 연결마다 별도의 DB가 생기므로 연결을 하나로 고정하고,
/// 유휴 연결이 닫혀 DB가 사라지지 않도록 수명 제한을 끕니다.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    pool
}

pub async fn test_state_with(limits: Limits) -> AppState {
    AppState {
        pool: test_pool().await,
        session_secret: TEST_SECRET.to_string(),
        base_url: "http://md.test".to_string(),
        limits,
        render: RenderOptions::default(),
    }
}

pub async fn test_state() -> AppState {
    test_state_with(Limits::default()).await
}
