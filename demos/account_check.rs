/// 查询账号示例
///
/// 在 `.env` 或环境变量中设置 TENCENT_IM_SDKAPPID、TENCENT_IM_KEY、TENCENT_IM_IDENTIFIER 后运行：
/// `cargo run --example account_check`

use tencent_im_sdk::{AccountCheckResult, ImClient, ImError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let client = ImClient::from_env()?;

    let accounts = ["1000001", "1000002", "1000003", "1000004", "1000005"];
    match client.account_check(&accounts).await {
        Ok(resp) => {
            let result: AccountCheckResult = resp.decode()?;
            for item in result.result_item {
                println!(
                    "{}: {} (ResultCode={})",
                    item.user_id, item.account_status, item.result_code
                );
            }
        }
        Err(ImError::Remote { code, message }) => {
            println!("{}----{}", code, message);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
