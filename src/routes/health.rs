//! # 헬스체크(Health Check) 핸들러
//!
//! ## 엔드포인트
//! - `GET /health` → `{ "status": "ok" }`
//!
//! 컨테이너 헬스체크나 로드밸런서가 서버 가동 여부를 확인할 때 사용합니다.

use axum::Json;
use serde_json::{json, Value};

/// `GET /health`: 저장소를 건드리지 않으므로 실패하지 않습니다.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}
