/// 回调服务器示例
///
/// 在 IM 控制台把回调地址配置为 `http://<host>:3000/callback`，
/// 开启回调鉴权时设置 TENCENT_IM_CALLBACK_TOKEN。

use std::env;

use serde_json::Value;
use tencent_im_sdk::{
    start_callback_server, CallbackAck, CallbackConfig, CallbackEvent, CallbackHandler, ImError,
};

/// 拦截包含敏感词的单聊消息
#[derive(Clone)]
struct KeywordFilter {
    keyword: String,
}

impl CallbackHandler for KeywordFilter {
    fn handle_callback(
        &self,
        event: CallbackEvent,
    ) -> impl std::future::Future<Output = Result<CallbackAck, ImError>> + Send {
        let keyword = self.keyword.clone();
        async move {
            println!("收到回调: {}", event.command);

            if event.command != "C2C.CallbackBeforeSendMsg" {
                return Ok(CallbackAck::ok());
            }

            let texts = event.body["MsgBody"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|elem| elem["MsgContent"]["Text"].as_str());
            for text in texts {
                if text.contains(&keyword) {
                    println!("  拦截消息: {}", text);
                    return Ok(CallbackAck::deny(1, "message blocked"));
                }
            }

            if let Some(from) = event.body.get("From_Account").and_then(Value::as_str) {
                println!("  放行来自 {} 的消息", from);
            }
            Ok(CallbackAck::ok())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = CallbackConfig {
        token: env::var("TENCENT_IM_CALLBACK_TOKEN").ok(),
        sdk_app_id: env::var("TENCENT_IM_SDKAPPID")
            .ok()
            .and_then(|s| s.parse().ok()),
        ..CallbackConfig::default()
    };

    let handler = KeywordFilter {
        keyword: "广告".to_string(),
    };

    start_callback_server(config, handler).await?;
    Ok(())
}
