use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// REST API 通用响应结构
///
/// 除三个公共字段外，其余字段（如 `ResultItem`、`MsgKey`）都保留在 `data` 中。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImResponse {
    /// 处理结果，OK 表示成功，FAIL 表示失败
    #[serde(rename = "ActionStatus", default)]
    pub action_status: String,
    /// 错误码，0 表示成功
    #[serde(rename = "ErrorCode")]
    pub error_code: i64,
    /// 错误信息
    #[serde(rename = "ErrorInfo", default)]
    pub error_info: String,
    /// 接口相关的其余字段
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ImResponse {
    pub fn is_ok(&self) -> bool {
        self.error_code == 0 && self.action_status != "FAIL"
    }

    /// 取出某个响应字段
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// 把响应字段解析为具体类型，例如 [`AccountCheckResult`]
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ImError> {
        serde_json::from_value(Value::Object(self.data.clone()))
            .map_err(|e| ImError::Transport(format!("Failed to decode payload: {}", e)))
    }
}

/// 单发消息结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendMsgResult {
    /// 消息时间戳
    #[serde(rename = "MsgTime", default)]
    pub msg_time: i64,
    /// 消息唯一标识，用于撤回
    #[serde(rename = "MsgKey", default)]
    pub msg_key: String,
}

/// 批量发消息结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSendMsgResult {
    #[serde(rename = "MsgKey", default)]
    pub msg_key: Option<String>,
    /// 发送失败的接收方
    #[serde(rename = "ErrorList", default)]
    pub error_list: Vec<BatchSendError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSendError {
    #[serde(rename = "To_Account")]
    pub to_account: String,
    #[serde(rename = "ErrorCode")]
    pub error_code: i64,
}

/// 查询账号结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountCheckResult {
    #[serde(rename = "ResultItem", default)]
    pub result_item: Vec<AccountCheckItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountCheckItem {
    #[serde(rename = "UserID")]
    pub user_id: String,
    /// 单个账号的检查结果，0 表示成功
    #[serde(rename = "ResultCode", default)]
    pub result_code: i64,
    #[serde(rename = "ResultInfo", default)]
    pub result_info: String,
    /// Imported 表示已导入，NotImported 表示未导入
    #[serde(rename = "AccountStatus", default)]
    pub account_status: String,
}

impl AccountCheckItem {
    pub fn is_imported(&self) -> bool {
        self.account_status == "Imported"
    }
}

/// 删除账号结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountDeleteResult {
    #[serde(rename = "ResultItem", default)]
    pub result_item: Vec<AccountDeleteItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountDeleteItem {
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "ResultCode", default)]
    pub result_code: i64,
    #[serde(rename = "ResultInfo", default)]
    pub result_info: String,
}

/// 批量导入账号结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiAccountImportResult {
    /// 导入失败的账号
    #[serde(rename = "FailAccounts", default)]
    pub fail_accounts: Vec<String>,
}

/// 查询在线状态结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryStateResult {
    #[serde(rename = "QueryResult", default)]
    pub query_result: Vec<OnlineState>,
    #[serde(rename = "ErrorList", default)]
    pub error_list: Vec<QueryStateError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnlineState {
    #[serde(rename = "To_Account")]
    pub to_account: String,
    /// Online / PushOnline / Offline
    #[serde(rename = "Status")]
    pub status: String,
    /// 仅在请求中 IsNeedDetail 为 1 时返回
    #[serde(rename = "Detail", default)]
    pub detail: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryStateError {
    #[serde(rename = "To_Account")]
    pub to_account: String,
    #[serde(rename = "ErrorCode")]
    pub error_code: i64,
}

/// SDK 错误
#[derive(Debug, thiserror::Error)]
pub enum ImError {
    /// 请求未能完成或响应无法解析
    #[error("Transport Error: {0}")]
    Transport(String),
    /// 服务端返回了非零错误码
    #[error("Tencent IM Error {code}: {message}")]
    Remote { code: i64, message: String },
    /// 配置错误
    #[error("Config Error: {0}")]
    Config(String),
    /// UserSig 生成或校验失败
    #[error("Signature Error: {0}")]
    Signature(String),
}

impl ImError {
    /// 根据服务端错误码创建错误
    pub fn from_code(code: i64, message: String) -> Self {
        ImError::Remote { code, message }
    }

    /// 服务端错误码，非服务端错误时为 None
    pub fn code(&self) -> Option<i64> {
        match self {
            ImError::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}
