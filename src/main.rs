//! # mdspace 웹 서버 진입점
//!
//! 마크다운을 붙여넣고 공유 링크를 만들어 주는 서비스입니다.
//! 공유된 문서는 일정 시간이 지나면 만료되고, 누구나 원문 줄 단위로 댓글을 달 수 있습니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩과 로깅 초기화
//! 2. SQLite 연결 풀 생성과 마이그레이션
//! 3. 만료 문서 정리 작업 시작
//! 4. 라우터 구성과 HTTP 서버 시작

mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
#[cfg(test)]
mod testing;

use anyhow::Result;
use chrono::Utc;
use config::Config;
use routes::AppState;
use services::markdown::RenderOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::{str::FromStr, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mdspace=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting mdspace server on {}:{}", config.host, config.port);

    // DB 파일이 없으면 새로 만들고, 댓글 삭제가 문서 삭제를 따라가도록 외래 키를 켭니다.
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations completed");

    tokio::spawn(purge_expired_loop(
        pool.clone(),
        Duration::from_secs(config.purge_interval_secs),
    ));

    let state = AppState {
        pool,
        session_secret: config.session_secret.clone(),
        base_url: config.base_url.clone(),
        limits: config.limits,
        render: RenderOptions::default(),
    };

    let app = routes::router(state, &config.static_dir);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// 만료된 문서와 댓글을 주기적으로 지웁니다.
///
/// 조회 쿼리가 이미 만료 문서를 걸러내므로, 이 작업은 저장 공간만 정리합니다.
/// 실패해도 다음 주기에 다시 시도합니다.
async fn purge_expired_loop(pool: SqlitePool, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        match db::purge_expired(&pool, Utc::now()).await {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "Purged expired markdowns"),
            Err(e) => tracing::warn!("Failed to purge expired markdowns: {}", e),
        }
    }
}
