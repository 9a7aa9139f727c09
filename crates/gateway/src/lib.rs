//! # Gateway
//!
//! 分发器前的 HTTP 入口。
//!
//! - `POST /process` 解析 JSON 数组并交给分发器
//! - `GET /limits`、`GET /metrics`、`GET /health` 报告分发器状态
//!
//! 过载映射为 `429`，请求体格式错误为 `400`，其余失败均为 `500`。

mod decode;
mod error;
mod routes;

pub use decode::{decode_batch, BodyFormat};
pub use error::GatewayError;
pub use routes::{router, AppState};
