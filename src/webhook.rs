//! 第三方回调接收
//!
//! 腾讯云 IM 会把 `C2C.CallbackAfterSendMsg` 等回调 POST 到应用配置的 URL，
//! 地址上带有 `SdkAppid`、`CallbackCommand`、`contenttype`、`ClientIP`、`OptPlatform`，
//! 开启鉴权后还会带上 `RequestTime` 与 `Sign`。

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use warp::http::StatusCode;
use warp::Filter;

use crate::models::ImError;

/// 一次回调请求
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    /// 回调命令，例如 `C2C.CallbackAfterSendMsg`
    pub command: String,
    pub sdk_app_id: Option<u64>,
    pub client_ip: Option<String>,
    pub opt_platform: Option<String>,
    /// 回调请求体
    pub body: Value,
}

impl CallbackEvent {
    /// 把回调请求体解析为具体类型
    pub fn body_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, ImError> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| ImError::Transport(format!("Failed to decode callback body: {}", e)))
    }
}

/// 回调应答
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallbackAck {
    #[serde(rename = "ActionStatus")]
    pub action_status: String,
    #[serde(rename = "ErrorInfo")]
    pub error_info: String,
    /// 发消息前回调中 0 表示允许发送，1 表示拒绝
    #[serde(rename = "ErrorCode")]
    pub error_code: i64,
}

impl CallbackAck {
    pub fn ok() -> Self {
        Self {
            action_status: "OK".to_string(),
            error_info: String::new(),
            error_code: 0,
        }
    }

    /// 拒绝本次操作（仅对“之前回调”生效）
    pub fn deny(code: i64, info: impl Into<String>) -> Self {
        Self {
            action_status: "OK".to_string(),
            error_info: info.into(),
            error_code: code,
        }
    }
}

/// 回调处理器特征
pub trait CallbackHandler: Send + Sync + Clone + 'static {
    fn handle_callback(
        &self,
        event: CallbackEvent,
    ) -> impl std::future::Future<Output = Result<CallbackAck, ImError>> + Send;
}

/// 默认的回调处理器：记录日志并放行
#[derive(Clone, Default)]
pub struct DefaultCallbackHandler;

impl CallbackHandler for DefaultCallbackHandler {
    fn handle_callback(
        &self,
        event: CallbackEvent,
    ) -> impl std::future::Future<Output = Result<CallbackAck, ImError>> + Send {
        async move {
            log::info!("收到回调: command={}", event.command);
            log::debug!("回调内容: {}", event.body);
            Ok(CallbackAck::ok())
        }
    }
}

/// 回调服务器配置
#[derive(Debug, Clone)]
pub struct CallbackConfig {
    /// 路径段，不能为空
    pub path: String,
    pub port: u16,
    /// 回调鉴权 token，设置后校验 `Sign`
    pub token: Option<String>,
    /// 设置后拒绝其他应用的回调
    pub sdk_app_id: Option<u64>,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            path: "callback".to_string(),
            port: 3000,
            token: None,
            sdk_app_id: None,
        }
    }
}

/// 计算回调签名：`hex(sha256(token + RequestTime))`
pub fn callback_sign(token: &str, request_time: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(request_time.as_bytes());
    hex::encode(hasher.finalize())
}

/// 校验回调签名
pub fn verify_callback_sign(token: &str, request_time: &str, sign: &str) -> bool {
    callback_sign(token, request_time).eq_ignore_ascii_case(sign)
}

#[derive(Debug)]
struct CallbackGuard {
    token: Option<String>,
    sdk_app_id: Option<u64>,
}

/// 回调路由，可直接挂到已有的 warp 服务上
pub fn callback_routes<H: CallbackHandler>(
    config: &CallbackConfig,
    handler: H,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let handler_filter = warp::any().map(move || handler.clone());
    let guard = Arc::new(CallbackGuard {
        token: config.token.clone(),
        sdk_app_id: config.sdk_app_id,
    });
    let guard_filter = warp::any().map(move || guard.clone());

    let callback_route = warp::path(config.path.clone())
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::body::bytes())
        .and(handler_filter)
        .and(guard_filter)
        .and_then(
            |query: HashMap<String, String>,
             body: bytes::Bytes,
             handler: H,
             guard: Arc<CallbackGuard>| {
                handle_callback_request(query, body, handler, guard)
            },
        );

    // 健康检查路由
    let health_route = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    callback_route.or(health_route)
}

/// 启动回调服务器，绑定 127.0.0.1
pub async fn start_callback_server<H: CallbackHandler>(
    config: CallbackConfig,
    handler: H,
) -> Result<(), ImError> {
    let routes = callback_routes(&config, handler);
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    let (addr, server) = warp::serve(routes)
        .try_bind_ephemeral(addr)
        .map_err(|e| ImError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    log::info!("启动回调服务器: http://{}/{}", addr, config.path);
    server.await;
    Ok(())
}

fn reply(message: &'static str, status: StatusCode) -> Box<dyn warp::Reply> {
    Box::new(warp::reply::with_status(message, status))
}

async fn handle_callback_request<H: CallbackHandler>(
    query: HashMap<String, String>,
    body: bytes::Bytes,
    handler: H,
    guard: Arc<CallbackGuard>,
) -> Result<Box<dyn warp::Reply>, warp::Rejection> {
    if let Some(token) = &guard.token {
        let request_time = query.get("RequestTime").map(String::as_str).unwrap_or("");
        let sign = query.get("Sign").map(String::as_str).unwrap_or("");
        if !verify_callback_sign(token, request_time, sign) {
            log::warn!("回调签名校验失败: RequestTime={}", request_time);
            return Ok(reply("Invalid sign", StatusCode::UNAUTHORIZED));
        }
    }

    let sdk_app_id = query.get("SdkAppid").and_then(|s| s.parse::<u64>().ok());
    if let Some(expected) = guard.sdk_app_id {
        if sdk_app_id != Some(expected) {
            log::warn!("拒绝其他应用的回调: SdkAppid={:?}", sdk_app_id);
            return Ok(reply("SdkAppid mismatch", StatusCode::FORBIDDEN));
        }
    }

    let body: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            log::error!("解析回调 JSON 失败: {}", e);
            return Ok(reply("Invalid JSON", StatusCode::BAD_REQUEST));
        }
    };

    let command = query
        .get("CallbackCommand")
        .cloned()
        .or_else(|| {
            body.get("CallbackCommand")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();

    let event = CallbackEvent {
        command,
        sdk_app_id,
        client_ip: query.get("ClientIP").cloned(),
        opt_platform: query.get("OptPlatform").cloned(),
        body,
    };

    match handler.handle_callback(event).await {
        Ok(ack) => Ok(Box::new(warp::reply::json(&ack))),
        Err(e) => {
            log::error!("处理回调失败: {}", e);
            Ok(reply(
                "Callback processing failed",
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<CallbackEvent>>>,
    }

    impl CallbackHandler for Recorder {
        fn handle_callback(
            &self,
            event: CallbackEvent,
        ) -> impl std::future::Future<Output = Result<CallbackAck, ImError>> + Send {
            let events = self.events.clone();
            async move {
                let deny = event.body.get("Text").and_then(Value::as_str) == Some("spam");
                events.lock().unwrap().push(event);
                if deny {
                    Ok(CallbackAck::deny(1, "blocked"))
                } else {
                    Ok(CallbackAck::ok())
                }
            }
        }
    }

    #[derive(Clone)]
    struct Failing;

    impl CallbackHandler for Failing {
        fn handle_callback(
            &self,
            _event: CallbackEvent,
        ) -> impl std::future::Future<Output = Result<CallbackAck, ImError>> + Send {
            async move { Err(ImError::Transport("downstream unavailable".to_string())) }
        }
    }

    fn signed_config() -> CallbackConfig {
        CallbackConfig {
            token: Some("callback-token".to_string()),
            sdk_app_id: Some(1400000000),
            ..CallbackConfig::default()
        }
    }

    #[test]
    fn sign_is_hex_sha256() {
        let sign = callback_sign("token", "1700000000");
        assert_eq!(sign.len(), 64);
        assert!(verify_callback_sign("token", "1700000000", &sign));
        assert!(verify_callback_sign("token", "1700000000", &sign.to_uppercase()));
        assert!(!verify_callback_sign("token", "1700000001", &sign));
    }

    #[tokio::test]
    async fn callback_is_dispatched_and_acked() {
        let recorder = Recorder::default();
        let routes = callback_routes(&CallbackConfig::default(), recorder.clone());

        let resp = warp::test::request()
            .method("POST")
            .path("/callback?SdkAppid=1400000000&CallbackCommand=C2C.CallbackAfterSendMsg&contenttype=json&ClientIP=1.2.3.4&OptPlatform=Web")
            .body(r#"{"CallbackCommand":"C2C.CallbackAfterSendMsg","From_Account":"a","To_Account":"b"}"#)
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let ack: CallbackAck = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(ack, CallbackAck::ok());

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].command, "C2C.CallbackAfterSendMsg");
        assert_eq!(events[0].sdk_app_id, Some(1400000000));
        assert_eq!(events[0].client_ip.as_deref(), Some("1.2.3.4"));
        assert_eq!(events[0].body["From_Account"], json!("a"));
    }

    #[tokio::test]
    async fn handler_can_deny() {
        let routes = callback_routes(&CallbackConfig::default(), Recorder::default());
        let resp = warp::test::request()
            .method("POST")
            .path("/callback?CallbackCommand=C2C.CallbackBeforeSendMsg")
            .body(r#"{"Text":"spam"}"#)
            .reply(&routes)
            .await;

        let ack: CallbackAck = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(ack.error_code, 1);
        assert_eq!(ack.error_info, "blocked");
    }

    #[tokio::test]
    async fn signed_callback_is_accepted() {
        let routes = callback_routes(&signed_config(), Recorder::default());
        let sign = callback_sign("callback-token", "1700000000");

        let resp = warp::test::request()
            .method("POST")
            .path(&format!(
                "/callback?SdkAppid=1400000000&CallbackCommand=State.StateChange&RequestTime=1700000000&Sign={}",
                sign
            ))
            .body(r#"{"Info":{"Action":"Login","To_Account":"a"}}"#)
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_sign_is_rejected() {
        let routes = callback_routes(&signed_config(), Recorder::default());
        let resp = warp::test::request()
            .method("POST")
            .path("/callback?SdkAppid=1400000000&RequestTime=1700000000&Sign=deadbeef")
            .body("{}")
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn other_app_is_rejected() {
        let routes = callback_routes(&signed_config(), Recorder::default());
        let sign = callback_sign("callback-token", "1700000000");
        let resp = warp::test::request()
            .method("POST")
            .path(&format!(
                "/callback?SdkAppid=1400000001&RequestTime=1700000000&Sign={}",
                sign
            ))
            .body("{}")
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let routes = callback_routes(&CallbackConfig::default(), Recorder::default());
        let resp = warp::test::request()
            .method("POST")
            .path("/callback?contenttype=json")
            .body("not json")
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn handler_failure_is_server_error() {
        let routes = callback_routes(&CallbackConfig::default(), Failing);
        let resp = warp::test::request()
            .method("POST")
            .path("/callback?contenttype=json")
            .body("{}")
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_route_responds() {
        let routes = callback_routes(&CallbackConfig::default(), DefaultCallbackHandler);
        let resp = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(&resp.body()[..], b"OK");
    }
}
