//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `SESSION_SECRET`: 세션 쿠키 서명에 사용할 비밀키 (필수)
//! - `HOST`, `PORT`: 서버 바인딩 주소
//! - `BASE_URL`: 공유 링크 앞에 붙는 주소
//! - `STATIC_DIR`: `/static` 아래로 서빙할 정적 파일 디렉토리
//! - `DOCUMENT_TTL_HOURS`, `MAX_FILES_PER_USER`, `MAX_CONTENT_BYTES`,
//!   `MAX_COMMENT_CHARS`: 문서/댓글 제한
//! - `PURGE_INTERVAL_SECS`: 만료 문서 정리 주기

use chrono::Duration;
use std::env;
use std::str::FromStr;

/// 문서와 댓글에 적용되는 제한값 묶음
///
/// 핸들러마다 Config 전체를 넘기지 않도록 따로 분리했습니다.
/// 모든 필드가 Copy 가능한 타입이라 AppState에 그대로 복제해 넣습니다.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// 문서 수명 (생성 시각 + ttl = 만료 시각)
    pub ttl: Duration,
    /// 세션 하나가 동시에 보유할 수 있는 살아있는 문서 수
    pub max_files_per_user: i64,
    /// 공유 가능한 문서의 최대 바이트 수
    pub max_content_bytes: usize,
    /// 댓글 본문의 최대 문자 수 (바이트가 아닌 char 기준)
    pub max_comment_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            max_files_per_user: 10,
            max_content_bytes: 1024 * 1024,
            max_comment_chars: 1000,
        }
    }
}

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후 AppState로 나눠 전달됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 URL (예: "sqlite:data/mdspace.db?mode=rwc")
    pub database_url: String,
    /// 세션 쿠키(JWT) 서명/검증에 사용하는 비밀키
    pub session_secret: String,
    pub host: String,
    pub port: u16,
    /// 공유 링크 생성에 쓰는 외부 주소. 끝의 `/`는 제거된 상태로 저장됩니다.
    pub base_url: String,
    pub static_dir: String,
    pub limits: Limits,
    /// 만료 문서 정리 작업 주기 (초)
    pub purge_interval_secs: u64,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `SESSION_SECRET`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없거나 파싱에 실패해도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        let port: u16 = parse_or("PORT", 8080);
        let defaults = Limits::default();

        // BASE_URL이 없으면 포트 번호로 로컬 주소를 만듭니다.
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{}", port));

        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            session_secret: env::var("SESSION_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
            limits: Limits {
                ttl: Duration::hours(parse_or("DOCUMENT_TTL_HOURS", 24)),
                max_files_per_user: parse_or("MAX_FILES_PER_USER", defaults.max_files_per_user),
                max_content_bytes: parse_or("MAX_CONTENT_BYTES", defaults.max_content_bytes),
                max_comment_chars: parse_or("MAX_COMMENT_CHARS", defaults.max_comment_chars),
            },
            purge_interval_secs: purge_interval(parse_or("PURGE_INTERVAL_SECS", 300)),
        })
    }
}

/// 환경변수를 읽어 `T`로 파싱하고, 없거나 잘못된 값이면 기본값을 사용합니다.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// 정리 주기는 최소 1초입니다. (`tokio::time::interval`은 0을 받지 않음)
fn purge_interval(secs: u64) -> u64 {
    secs.max(1)
}
