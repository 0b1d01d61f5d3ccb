//! 腾讯云即时通信 IM REST API 的 Rust SDK
//!
//! 每个接口按同一流程处理：构造默认参数 → 合并调用方的额外参数 → 生成带 UserSig 的请求地址
//! → POST JSON → 解析响应。客户端不保存调用间状态，不做重试。
//!
//! ```no_run
//! use serde_json::json;
//! use tencent_im_sdk::{ImClient, ImConfig, MsgType, Options};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tencent_im_sdk::ImError> {
//!     let client = ImClient::new(ImConfig::new(1400000000, "your-key", "administrator"))?;
//!
//!     client
//!         .send_msg("administrator", "user42", MsgType::Text, json!({"Text": "hello"}), Options::new())
//!         .await?;
//!
//!     let resp = client.account_check(&["1000001", "1000002"]).await?;
//!     let result: tencent_im_sdk::AccountCheckResult = resp.decode()?;
//!     for item in result.result_item {
//!         println!("{} -> {}", item.user_id, item.account_status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod models;
pub mod params;
pub mod usersig;
pub mod webhook;

// 重新导出主要类型以便外部使用
pub use client::{parse_response, Command, ImClient, ImRequest};
pub use config::{ImConfig, DEFAULT_BASE_URL};
pub use models::*;
pub use params::{merge, msg_body, MsgType, Options, ParamMap};
pub use usersig::{gen_user_sig, verify_user_sig, UserSigInfo};
pub use webhook::{
    start_callback_server, CallbackAck, CallbackConfig, CallbackEvent, CallbackHandler,
    DefaultCallbackHandler,
};
