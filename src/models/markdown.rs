//! # 마크다운 문서 모델 정의
//!
//! 공유된 문서 한 건과, 문서를 만들고 조회할 때 오가는 요청/응답 구조체들입니다.
//! 문서 내용은 공유 후 수정되지 않습니다. 다시 공유하면 새 문서가 만들어집니다.

use serde::{Deserialize, Serialize};

/// 문서 엔티티, DB의 `markdowns` 테이블 한 행에 대응합니다.
///
/// `owner_id`는 세션 ID 자체가 아니라 그 SHA-256 해시입니다.
/// 응답에는 절대 포함하지 않고, 대신 요청자 기준의 `is_owner`를 계산해 돌려줍니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Markdown {
    /// 8자리 16진수 식별자. 공유 링크의 마지막 경로 조각입니다.
    pub id: String,
    pub content: String,
    /// 조회수. 쿼리 없는 뷰어 조회와 API 조회마다 먼저 1 증가한 뒤 읽습니다.
    pub views: i64,
    #[serde(skip_serializing)]
    pub owner_id: String,
    pub created_at: String,
    /// 이 시각이 지나면 조회/댓글/삭제 모두 NotFound가 됩니다.
    pub expires_at: String,
}

impl Markdown {
    /// 요청한 세션의 소유자 키로 응답을 만듭니다.
    pub fn into_response_for(self, owner_key: &str) -> MarkdownResponse {
        let is_owner = self.owner_id == owner_key;
        MarkdownResponse {
            id: self.id,
            content: self.content,
            views: self.views,
            is_owner,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// `GET /api/markdown/{id}` 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownResponse {
    pub id: String,
    pub content: String,
    pub views: i64,
    pub is_owner: bool,
    pub created_at: String,
    pub expires_at: String,
}

/// `POST /api/markdown` 요청 본문
#[derive(Debug, Deserialize)]
pub struct CreateMarkdownRequest {
    #[serde(default)]
    pub content: String,
}

/// 공유 링크 생성 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub id: String,
    pub share_url: String,
    pub expires_at: String,
}

/// `GET /api/user/stats` 응답 (표시용, 핵심 로직에는 쓰이지 않음)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub files_count: i64,
    pub files_limit: i64,
}

/// `POST /api/preview` 요청/응답
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub html: String,
}
