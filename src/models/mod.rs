//! # 데이터 모델 모듈
//!
//! - `markdown`: 공유 문서(Markdown)와 문서 API 요청/응답 구조체
//! - `comment`: 줄 단위 댓글(Comment)과 댓글 검증

pub mod comment;
pub mod markdown;

pub use comment::*;
pub use markdown::*;
