//! # 댓글 모델 정의
//!
//! 댓글은 문서의 특정 줄 번호에 붙습니다. 문서 소유 여부와 관계없이 누구나 달 수 있고,
//! 한 번 저장되면 수정/삭제되지 않습니다 (문서가 삭제되거나 만료될 때 함께 사라짐).

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// 작성자 이름을 비워두면 사용하는 기본값
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// 댓글 엔티티, DB의 `comments` 테이블 한 행에 대응합니다.
///
/// `line`은 저장 시점의 문서 줄 수와 대조하지 않습니다.
/// 줄 수보다 큰 번호도 그대로 저장되며, 화면에서는 해당 줄 강조만 생략됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub line: i64,
    pub text: String,
    pub author: String,
    pub created_at: String,
}

/// `POST /api/markdown/{id}/comments` 요청 본문, 페이지의 댓글 폼과도 공유합니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCommentRequest {
    pub line: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: String,
}

/// 검증을 통과한 댓글. 저장소에는 이 타입만 전달됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub line: i64,
    pub text: String,
    pub author: String,
}

impl CreateCommentRequest {
    /// 저장소에 접근하기 전에 댓글을 검증하고 정리합니다.
    ///
    /// - 줄 번호는 1 이상이어야 합니다.
    /// - 본문은 앞뒤 공백을 제거한 뒤 비어 있으면 안 되고, `max_chars`자를 넘으면 안 됩니다.
    /// - 작성자는 공백을 제거한 뒤 비어 있으면 `"Anonymous"`가 됩니다.
    pub fn validate(&self, max_chars: usize) -> Result<NewComment, AppError> {
        if self.line < 1 {
            return Err(AppError::BadRequest("Line number must be positive".to_string()));
        }

        let text = self.text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("Comment text cannot be empty".to_string()));
        }
        if text.chars().count() > max_chars {
            return Err(AppError::BadRequest(format!(
                "Comment too long (max {} characters)",
                max_chars
            )));
        }

        let author = match self.author.trim() {
            "" => ANONYMOUS_AUTHOR,
            name => name,
        };

        Ok(NewComment {
            line: self.line,
            text: text.to_string(),
            author: author.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn request(line: i64, text: &str, author: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            line,
            text: text.to_string(),
            author: author.to_string(),
        }
    }

    #[test]
    fn blank_author_becomes_anonymous() {
        let comment = request(1, "nice", "").validate(1000).unwrap();
        assert_eq!(comment.author, "Anonymous");
        assert_eq!(comment.text, "nice");
        assert_eq!(comment.line, 1);

        let comment = request(1, "nice", "   ").validate(1000).unwrap();
        assert_eq!(comment.author, "Anonymous");
    }

    #[test]
    fn text_and_author_are_trimmed() {
        let comment = request(3, "  looks good \n", "  kim ").validate(1000).unwrap();
        assert_eq!(comment.text, "looks good");
        assert_eq!(comment.author, "kim");
    }

    #[test]
    fn empty_text_is_invalid_input() {
        let err = request(1, "   \n\t", "kim").validate(1000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn non_positive_line_is_rejected() {
        assert!(request(0, "text", "").validate(1000).is_err());
        assert!(request(-4, "text", "").validate(1000).is_err());
    }

    #[test]
    fn length_is_counted_in_characters() {
        let hangul = "가".repeat(10);
        assert!(request(1, &hangul, "").validate(10).is_ok());
        assert!(request(1, &"가".repeat(11), "").validate(10).is_err());
    }
}
