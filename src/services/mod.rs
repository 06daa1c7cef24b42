//! # 서비스 모듈
//!
//! HTTP와 DB에 의존하지 않는 순수 로직을 모아둔 모듈입니다.
//!
//! 각 하위 모듈:
//! - `lines`: 줄 단위로 고정된 문서 모델 (줄 분할, 댓글 위치, 렌더링 결과)
//! - `markdown`: 마크다운 → HTML 렌더링과 코드 하이라이트
//! - `page`: 작성/뷰어 페이지 HTML
//! - `viewer`: 뷰어 화면 상태와 이벤트 처리

pub mod lines;
pub mod markdown;
pub mod page;
pub mod viewer;
