use crate::db::{short_id, timestamp};
use crate::error::AppError;
use crate::models::{Comment, NewComment};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// 댓글을 문서 뒤에 추가합니다. 문서 존재 여부는 호출하는 쪽에서 먼저 확인합니다.
pub async fn add_comment(
    pool: &SqlitePool,
    markdown_id: &str,
    comment: &NewComment,
    now: DateTime<Utc>,
) -> Result<Comment, AppError> {
    let id = short_id();
    let created_at = timestamp(now);

    sqlx::query(
        r#"
        INSERT INTO comments (id, markdown_id, line, text, author, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(markdown_id)
    .bind(comment.line)
    .bind(&comment.text)
    .bind(&comment.author)
    .bind(&created_at)
    .execute(pool)
    .await?;

    Ok(Comment {
        id,
        line: comment.line,
        text: comment.text.clone(),
        author: comment.author.clone(),
        created_at,
    })
}

/// 문서의 댓글을 작성 순서대로 가져옵니다. 줄 번호로 정렬하지 않습니다.
pub async fn list_comments(pool: &SqlitePool, markdown_id: &str) -> Result<Vec<Comment>, AppError> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, line, text, author, created_at
        FROM comments
        WHERE markdown_id = ?
        ORDER BY seq ASC
        "#,
    )
    .bind(markdown_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}
