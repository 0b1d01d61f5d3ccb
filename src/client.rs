use rand_core::{OsRng, RngCore};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Url};

use crate::config::ImConfig;
use crate::models::{ImError, ImResponse};
use crate::params::ParamMap;
use crate::usersig;

const API_VERSION: &str = "v4";

/// 远程命令：服务名 + 命令字
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    pub service: &'static str,
    pub name: &'static str,
}

impl Command {
    /// 单发单聊消息
    pub const SEND_MSG: Command = Command::new("openim", "sendmsg");
    /// 批量发单聊消息
    pub const BATCH_SEND_MSG: Command = Command::new("openim", "batchsendmsg");
    /// 查询账号在线状态
    pub const QUERY_STATE: Command = Command::new("openim", "querystate");
    /// 撤回单聊消息
    pub const MSG_WITHDRAW: Command = Command::new("openim", "admin_msgwithdraw");
    /// 导入单个账号
    pub const ACCOUNT_IMPORT: Command = Command::new("im_open_login_svc", "account_import");
    /// 批量导入账号
    pub const MULTI_ACCOUNT_IMPORT: Command =
        Command::new("im_open_login_svc", "multiaccount_import");
    /// 删除账号
    pub const ACCOUNT_DELETE: Command = Command::new("im_open_login_svc", "account_delete");
    /// 查询账号是否已导入
    pub const ACCOUNT_CHECK: Command = Command::new("im_open_login_svc", "account_check");
    /// 失效账号登录态
    pub const KICK: Command = Command::new("im_open_login_svc", "kick");

    pub const fn new(service: &'static str, name: &'static str) -> Self {
        Self { service, name }
    }

    /// `service/command`
    pub fn path(&self) -> String {
        format!("{}/{}", self.service, self.name)
    }
}

/// 一次待发送的请求：命令和合并后的请求体
#[derive(Debug, Clone, PartialEq)]
pub struct ImRequest {
    pub command: Command,
    pub body: ParamMap,
}

impl ImRequest {
    pub fn new(command: Command, body: ParamMap) -> Self {
        Self { command, body }
    }
}

/// 核心客户端，持有 HTTP 客户端和不可变配置
///
/// 每次调用独立生成 UserSig 与请求地址，不保存任何调用间状态，可在多个任务间克隆共享。
#[derive(Clone)]
pub struct ImClient {
    client: Client,
    config: ImConfig,
}

impl ImClient {
    /// 使用指定配置创建客户端
    pub fn new(config: ImConfig) -> Result<Self, ImError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("TencentImSdk/", env!("CARGO_PKG_VERSION"))),
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ImError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// 从环境变量初始化客户端
    pub fn from_env() -> Result<Self, ImError> {
        Self::new(ImConfig::from_env()?)
    }

    /// 使用调用方提供的 HTTP 客户端
    pub fn with_http_client(config: ImConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ImConfig {
        &self.config
    }

    /// 生成命令的完整请求地址（含新签发的 UserSig）
    pub fn endpoint(&self, command: Command) -> Result<Url, ImError> {
        let user_sig = usersig::gen_user_sig(
            self.config.sdk_app_id(),
            self.config.key(),
            self.config.identifier(),
            self.config.sig_expire(),
        )?;
        self.endpoint_with(command, &user_sig, OsRng.next_u32())
    }

    pub(crate) fn endpoint_with(
        &self,
        command: Command,
        user_sig: &str,
        random: u32,
    ) -> Result<Url, ImError> {
        let base = format!(
            "{}/{}/{}/{}",
            self.config.base_url(),
            API_VERSION,
            command.service,
            command.name
        );
        let sdk_app_id = self.config.sdk_app_id().to_string();
        let random = random.to_string();

        Url::parse_with_params(
            &base,
            &[
                ("sdkappid", sdk_app_id.as_str()),
                ("identifier", self.config.identifier()),
                ("usersig", user_sig),
                ("random", random.as_str()),
                ("contenttype", "json"),
            ],
        )
        .map_err(|e| ImError::Config(format!("Invalid base url {}: {}", base, e)))
    }

    /// 发送请求并解析响应
    pub async fn execute(&self, request: ImRequest) -> Result<ImResponse, ImError> {
        let url = self.endpoint(request.command)?;

        log::debug!(
            "调用 {} -> {}{}",
            request.command.path(),
            url.origin().ascii_serialization(),
            url.path()
        );

        let resp = self
            .client
            .post(url)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| ImError::Transport(e.to_string()))?;

        let status = resp.status();
        let response_text = resp
            .text()
            .await
            .map_err(|e| ImError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ImError::Transport(format!("HTTP {}: {}", status, response_text)));
        }

        let response = parse_response(&response_text)?;
        log::debug!("{} 调用成功", request.command.path());
        Ok(response)
    }

    /// 调用任意命令，请求体原样发送
    pub async fn call(&self, command: Command, body: ParamMap) -> Result<ImResponse, ImError> {
        self.execute(ImRequest::new(command, body)).await
    }
}

/// 解析响应文本，错误码非零时返回 [`ImError::Remote`]
pub fn parse_response(text: &str) -> Result<ImResponse, ImError> {
    let response: ImResponse = serde_json::from_str(text).map_err(|e| {
        ImError::Transport(format!("Failed to parse response: {} - Response: {}", e, text))
    })?;

    if !response.is_ok() {
        log::warn!(
            "腾讯云 IM 返回错误: {} - {}",
            response.error_code,
            response.error_info
        );
        return Err(ImError::from_code(response.error_code, response.error_info));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn client() -> ImClient {
        let config = ImConfig::new(1400000000, "test-key", "administrator")
            .with_base_url("https://console.tim.qq.com/");
        ImClient::new(config).unwrap()
    }

    #[test]
    fn endpoint_embeds_credentials() {
        let url = client()
            .endpoint_with(Command::SEND_MSG, "sig*value-_", 99)
            .unwrap();
        assert_eq!(url.path(), "/v4/openim/sendmsg");

        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(query["sdkappid"], "1400000000");
        assert_eq!(query["identifier"], "administrator");
        assert_eq!(query["usersig"], "sig*value-_");
        assert_eq!(query["random"], "99");
        assert_eq!(query["contenttype"], "json");
    }

    #[test]
    fn endpoint_signature_verifies() {
        let client = client();
        let url = client.endpoint(Command::ACCOUNT_CHECK).unwrap();
        assert_eq!(url.path(), "/v4/im_open_login_svc/account_check");

        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let info = usersig::verify_user_sig(
            &query["usersig"],
            1400000000,
            "test-key",
            "administrator",
            crate::params::unix_now(),
        )
        .unwrap();
        assert_eq!(info.identifier, "administrator");
        assert!(query["random"].parse::<u32>().is_ok());
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let config = ImConfig::new(1, "k", "admin").with_base_url("not a url");
        let client = ImClient::new(config).unwrap();
        let err = client.endpoint_with(Command::KICK, "sig", 1).unwrap_err();
        assert!(matches!(err, ImError::Config(_)));
    }

    #[test]
    fn command_path() {
        assert_eq!(Command::BATCH_SEND_MSG.path(), "openim/batchsendmsg");
        assert_eq!(Command::new("group_open_http_svc", "create_group").path(), "group_open_http_svc/create_group");
    }

    #[test]
    fn parse_success_response() {
        let resp = parse_response(r#"{"ActionStatus":"OK","ErrorCode":0,"ErrorInfo":""}"#).unwrap();
        assert_eq!(resp.action_status, "OK");
    }

    #[test]
    fn parse_remote_error() {
        let err = parse_response(r#"{"ActionStatus":"FAIL","ErrorCode":70107,"ErrorInfo":"The requested identifier does not exist"}"#)
            .unwrap_err();
        match err {
            ImError::Remote { code, message } => {
                assert_eq!(code, 70107);
                assert_eq!(message, "The requested identifier does not exist");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn parse_bad_json_is_transport_error() {
        let err = parse_response("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ImError::Transport(_)));
    }
}
