//! 单聊消息（openim）
//!
//! 这些接口不检查发送方与接收方的好友关系（包括黑名单），也不检查接收方是否被禁言。

use serde_json::Value;

use super::string_list;
use crate::client::{Command, ImClient, ImRequest};
use crate::models::{ImError, ImResponse};
use crate::params::{merge, msg_body, unix_now, MsgType, Options, ParamMap};

/// 构造单发单聊消息请求
///
/// 默认字段：`From_Account`、`To_Account`、`MsgRandom`、`MsgTimeStamp`、`MsgBody`，
/// 其中 `MsgRandom` 与 `MsgTimeStamp` 都取当前 UNIX 时间戳。`options` 中的同名字段
/// 覆盖默认值，包括 `MsgBody` 本身。常用选填字段：
///
/// - `SyncOtherMachine`：1 同步到发送方在线终端和漫游，2 不同步
/// - `MsgLifeTime`：离线保存时长（秒），最长 7 天，0 表示只发在线用户
/// - `ForbidCallbackControl`：禁止发消息前/后回调
/// - `OfflinePushInfo`：离线推送信息
pub fn send_msg_request(
    from_account: &str,
    to_account: &str,
    msg_type: impl Into<MsgType>,
    msg_content: Value,
    options: Options,
) -> ImRequest {
    send_msg_request_at(
        from_account,
        to_account,
        &msg_type.into(),
        msg_content,
        options,
        unix_now(),
    )
}

pub(crate) fn send_msg_request_at(
    from_account: &str,
    to_account: &str,
    msg_type: &MsgType,
    msg_content: Value,
    options: Options,
    time: u64,
) -> ImRequest {
    let mut base = ParamMap::new();
    base.insert("From_Account".to_string(), Value::from(from_account));
    base.insert("To_Account".to_string(), Value::from(to_account));
    base.insert("MsgRandom".to_string(), Value::from(time));
    base.insert("MsgTimeStamp".to_string(), Value::from(time));
    base.insert("MsgBody".to_string(), msg_body(msg_type, msg_content));

    ImRequest::new(Command::SEND_MSG, merge(base, options))
}

/// 构造批量发单聊消息请求
///
/// 与单发相比不带 `MsgTimeStamp`，`To_Account` 为完整的接收方列表（服务端限制最多 500 个，
/// 本地不做检查）。该接口不触发回调。
pub fn batch_send_msg_request<S: AsRef<str>>(
    from_account: &str,
    to_accounts: &[S],
    msg_type: impl Into<MsgType>,
    msg_content: Value,
    options: Options,
) -> ImRequest {
    batch_send_msg_request_at(
        from_account,
        to_accounts,
        &msg_type.into(),
        msg_content,
        options,
        unix_now(),
    )
}

pub(crate) fn batch_send_msg_request_at<S: AsRef<str>>(
    from_account: &str,
    to_accounts: &[S],
    msg_type: &MsgType,
    msg_content: Value,
    options: Options,
    time: u64,
) -> ImRequest {
    let mut base = ParamMap::new();
    base.insert("From_Account".to_string(), Value::from(from_account));
    base.insert("To_Account".to_string(), string_list(to_accounts));
    base.insert("MsgRandom".to_string(), Value::from(time));
    base.insert("MsgBody".to_string(), msg_body(msg_type, msg_content));

    ImRequest::new(Command::BATCH_SEND_MSG, merge(base, options))
}

/// 构造查询在线状态请求，`IsNeedDetail` 等选填字段通过 `options` 传入
pub fn query_state_request<S: AsRef<str>>(to_accounts: &[S], options: Options) -> ImRequest {
    let mut base = ParamMap::new();
    base.insert("To_Account".to_string(), string_list(to_accounts));

    ImRequest::new(Command::QUERY_STATE, merge(base, options))
}

/// 构造撤回单聊消息请求，`msg_key` 来自发送结果中的 `MsgKey`
pub fn msg_withdraw_request(from_account: &str, to_account: &str, msg_key: &str) -> ImRequest {
    let mut base = ParamMap::new();
    base.insert("From_Account".to_string(), Value::from(from_account));
    base.insert("To_Account".to_string(), Value::from(to_account));
    base.insert("MsgKey".to_string(), Value::from(msg_key));

    ImRequest::new(Command::MSG_WITHDRAW, base)
}

impl ImClient {
    /// 单发单聊消息
    ///
    /// ```no_run
    /// # async fn demo(client: tencent_im_sdk::ImClient) -> Result<(), tencent_im_sdk::ImError> {
    /// use tencent_im_sdk::{MsgType, Options};
    /// use serde_json::json;
    ///
    /// let resp = client
    ///     .send_msg("admin", "user42", MsgType::Text, json!({"Text": "hello"}), Options::new())
    ///     .await?;
    /// println!("{:?}", resp.get("MsgKey"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_msg(
        &self,
        from_account: &str,
        to_account: &str,
        msg_type: impl Into<MsgType>,
        msg_content: Value,
        options: Options,
    ) -> Result<ImResponse, ImError> {
        let request = send_msg_request(from_account, to_account, msg_type, msg_content, options);
        self.execute(request).await
    }

    /// 批量发单聊消息
    pub async fn batch_send_msg<S: AsRef<str>>(
        &self,
        from_account: &str,
        to_accounts: &[S],
        msg_type: impl Into<MsgType>,
        msg_content: Value,
        options: Options,
    ) -> Result<ImResponse, ImError> {
        let request =
            batch_send_msg_request(from_account, to_accounts, msg_type, msg_content, options);
        self.execute(request).await
    }

    /// 查询账号在线状态
    pub async fn query_state<S: AsRef<str>>(
        &self,
        to_accounts: &[S],
        options: Options,
    ) -> Result<ImResponse, ImError> {
        self.execute(query_state_request(to_accounts, options)).await
    }

    /// 撤回单聊消息
    pub async fn msg_withdraw(
        &self,
        from_account: &str,
        to_account: &str,
        msg_key: &str,
    ) -> Result<ImResponse, ImError> {
        self.execute(msg_withdraw_request(from_account, to_account, msg_key))
            .await
    }
}
