//! # 공유 문서 데이터베이스 쿼리 모듈
//!
//! `markdowns` 테이블에 대한 쿼리 함수들입니다.
//! 만료된 행은 정리 작업이 지우기 전이라도 모든 조회에서 보이지 않아야 하므로,
//! 읽는 쿼리마다 `expires_at > now` 조건을 붙입니다.

use crate::config::Limits;
use crate::db::{short_id, timestamp};
use crate::error::AppError;
use crate::models::Markdown;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// ID 충돌 시 다시 시도할 횟수 (8자리 ID라 드물지만 가능함)
const INSERT_ATTEMPTS: usize = 3;

/// 새 문서를 저장합니다.
///
/// 세션의 살아있는 문서 수 확인과 삽입을 한 문장으로 처리하므로
/// 동시에 여러 요청이 와도 제한을 넘지 않습니다.
///
/// # 반환값
/// - `Ok(Some(Markdown))`: 저장 성공
/// - `Ok(None)`: 세션당 문서 수 제한에 걸림
pub async fn create_markdown(
    pool: &SqlitePool,
    content: &str,
    owner_id: &str,
    limits: &Limits,
    now: DateTime<Utc>,
) -> Result<Option<Markdown>, AppError> {
    let created_at = timestamp(now);
    let expires_at = timestamp(now + limits.ttl);

    for attempt in 1..=INSERT_ATTEMPTS {
        let id = short_id();
        let result = sqlx::query(
            r#"
            INSERT INTO markdowns (id, content, views, owner_id, created_at, expires_at)
            SELECT ?, ?, 0, ?, ?, ?
            WHERE (
                SELECT COUNT(*) FROM markdowns WHERE owner_id = ? AND expires_at > ?
            ) < ?
            "#,
        )
        .bind(&id)
        .bind(content)
        .bind(owner_id)
        .bind(&created_at)
        .bind(&expires_at)
        .bind(owner_id)
        .bind(&created_at)
        .bind(limits.max_files_per_user)
        .execute(pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => return Ok(None),
            Ok(_) => {
                return Ok(Some(Markdown {
                    id,
                    content: content.to_string(),
                    views: 0,
                    owner_id: owner_id.to_string(),
                    created_at,
                    expires_at,
                }))
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::warn!("Markdown id collision on attempt {}: {}", attempt, id);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal("Could not allocate a markdown id".to_string()))
}

/// ID로 살아있는 문서를 조회합니다. 조회수는 바꾸지 않습니다.
pub async fn get_markdown(
    pool: &SqlitePool,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Option<Markdown>, AppError> {
    let markdown = sqlx::query_as::<_, Markdown>(
        r#"
        SELECT id, content, views, owner_id, created_at, expires_at
        FROM markdowns
        WHERE id = ? AND expires_at > ?
        "#,
    )
    .bind(id)
    .bind(timestamp(now))
    .fetch_optional(pool)
    .await?;

    Ok(markdown)
}

/// 조회수를 1 올리고, 올라간 값이 반영된 문서를 돌려줍니다.
pub async fn view_markdown(
    pool: &SqlitePool,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Option<Markdown>, AppError> {
    let markdown = sqlx::query_as::<_, Markdown>(
        r#"
        UPDATE markdowns SET views = views + 1
        WHERE id = ? AND expires_at > ?
        RETURNING id, content, views, owner_id, created_at, expires_at
        "#,
    )
    .bind(id)
    .bind(timestamp(now))
    .fetch_optional(pool)
    .await?;

    Ok(markdown)
}

/// 문서와 그 댓글을 삭제합니다. 소유자만 삭제할 수 있습니다.
///
/// # 에러
/// - `AppError::NotFound`: 문서가 없거나 만료됨
/// - `AppError::Forbidden`: 요청 세션이 소유자가 아님
pub async fn delete_markdown(
    pool: &SqlitePool,
    id: &str,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let owner: Option<String> =
        sqlx::query_scalar("SELECT owner_id FROM markdowns WHERE id = ? AND expires_at > ?")
            .bind(id)
            .bind(timestamp(now))
            .fetch_optional(&mut *tx)
            .await?;

    match owner {
        None => return Err(AppError::NotFound),
        Some(owner) if owner != owner_id => {
            return Err(AppError::Forbidden("Permission denied".to_string()))
        }
        Some(_) => {}
    }

    sqlx::query("DELETE FROM comments WHERE markdown_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM markdowns WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// 세션이 가진 살아있는 문서 수
pub async fn count_user_files(
    pool: &SqlitePool,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM markdowns WHERE owner_id = ? AND expires_at > ?")
            .bind(owner_id)
            .bind(timestamp(now))
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// 만료된 문서와 그 댓글을 지우고, 지운 문서 수를 돌려줍니다.
pub async fn purge_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64, AppError> {
    let now = timestamp(now);
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM comments WHERE markdown_id IN (SELECT id FROM markdowns WHERE expires_at <= ?)",
    )
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    let removed = sqlx::query("DELETE FROM markdowns WHERE expires_at <= ?")
        .bind(&now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(removed)
}
