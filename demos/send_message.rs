/// 单发与批量发消息示例
///
/// `cargo run --example send_message -- <from> <to> [to ...]`

use std::env;

use serde_json::json;
use tencent_im_sdk::{BatchSendMsgResult, ImClient, MsgType, Options, SendMsgResult};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("用法: send_message <from> <to> [to ...]");
        return Ok(());
    }
    let from = &args[0];
    let to = &args[1..];

    let client = ImClient::from_env()?;

    // 单发：不同步到发送方，离线保存 1 天
    println!("\n1. 单发文本消息...");
    let options = Options::new().sync_other_machine(2).msg_life_time(86400);
    let resp = client
        .send_msg(from, &to[0], MsgType::Text, json!({"Text": "你好"}), options)
        .await?;
    let sent: SendMsgResult = resp.decode()?;
    println!("MsgKey: {}", sent.msg_key);

    // 批量：自定义消息
    println!("\n2. 批量发送自定义消息...");
    let resp = client
        .batch_send_msg(
            from,
            to,
            MsgType::Custom,
            json!({"Data": "notice", "Desc": "系统通知"}),
            Options::new(),
        )
        .await?;
    let batch: BatchSendMsgResult = resp.decode()?;
    for failed in batch.error_list {
        println!("发送失败: {} ({})", failed.to_account, failed.error_code);
    }

    Ok(())
}
