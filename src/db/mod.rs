//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈:
//! - `markdowns`: 공유 문서 생성/조회/삭제, 조회수, 세션별 문서 수, 만료 정리
//! - `comments`: 줄 댓글 추가/목록
//!
//! 시각은 모두 `timestamp()` 형식의 문자열로 저장합니다.
//! 자릿수가 고정되어 있어 SQL에서 문자열 비교만으로 만료 여부를 판단할 수 있습니다.

pub mod comments;
pub mod markdowns;

pub use comments::*;
pub use markdowns::*;

use chrono::{DateTime, SecondsFormat, Utc};

/// UTC 시각을 `2026-01-01T00:00:00.000Z` 형식으로 변환합니다.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 8자리 16진수 짧은 ID (공유 링크, 댓글 ID)
pub fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let later = earlier + chrono::Duration::milliseconds(1);
        assert_eq!(timestamp(earlier), "2026-01-02T03:04:05.000Z");
        assert!(timestamp(earlier) < timestamp(later));
    }

    #[test]
    fn short_ids_are_eight_hex_chars() {
        let id = short_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
