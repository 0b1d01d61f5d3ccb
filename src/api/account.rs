//! 账号管理（im_open_login_svc）

use serde_json::Value;

use super::{string_list, user_id_items};
use crate::client::{Command, ImClient, ImRequest};
use crate::models::{ImError, ImResponse};
use crate::params::{merge, Options, ParamMap};

/// 构造查询账号请求：`{"CheckItem": [{"UserID": ..}, ..]}`
pub fn account_check_request<S: AsRef<str>>(accounts: &[S]) -> ImRequest {
    let mut base = ParamMap::new();
    base.insert("CheckItem".to_string(), user_id_items(accounts));
    ImRequest::new(Command::ACCOUNT_CHECK, base)
}

/// 构造导入单个账号请求，`Nick`、`FaceUrl` 通过 `options` 传入
pub fn account_import_request(user_id: &str, options: Options) -> ImRequest {
    let mut base = ParamMap::new();
    base.insert("UserID".to_string(), Value::from(user_id));
    ImRequest::new(Command::ACCOUNT_IMPORT, merge(base, options))
}

/// 构造批量导入账号请求：`{"Accounts": [..]}`
pub fn multi_account_import_request<S: AsRef<str>>(accounts: &[S]) -> ImRequest {
    let mut base = ParamMap::new();
    base.insert("Accounts".to_string(), string_list(accounts));
    ImRequest::new(Command::MULTI_ACCOUNT_IMPORT, base)
}

/// 构造删除账号请求：`{"DeleteItem": [{"UserID": ..}, ..]}`
pub fn account_delete_request<S: AsRef<str>>(accounts: &[S]) -> ImRequest {
    let mut base = ParamMap::new();
    base.insert("DeleteItem".to_string(), user_id_items(accounts));
    ImRequest::new(Command::ACCOUNT_DELETE, base)
}

/// 构造失效登录态请求
pub fn kick_request(user_id: &str) -> ImRequest {
    let mut base = ParamMap::new();
    base.insert("UserID".to_string(), Value::from(user_id));
    ImRequest::new(Command::KICK, base)
}

impl ImClient {
    /// 查询账号是否已导入，结果见 [`AccountCheckResult`](crate::AccountCheckResult)
    pub async fn account_check<S: AsRef<str>>(
        &self,
        accounts: &[S],
    ) -> Result<ImResponse, ImError> {
        self.execute(account_check_request(accounts)).await
    }

    /// 导入单个账号
    pub async fn account_import(
        &self,
        user_id: &str,
        options: Options,
    ) -> Result<ImResponse, ImError> {
        self.execute(account_import_request(user_id, options)).await
    }

    /// 批量导入账号
    pub async fn multi_account_import<S: AsRef<str>>(
        &self,
        accounts: &[S],
    ) -> Result<ImResponse, ImError> {
        self.execute(multi_account_import_request(accounts)).await
    }

    /// 删除账号
    pub async fn account_delete<S: AsRef<str>>(
        &self,
        accounts: &[S],
    ) -> Result<ImResponse, ImError> {
        self.execute(account_delete_request(accounts)).await
    }

    /// 失效账号登录态
    pub async fn kick(&self, user_id: &str) -> Result<ImResponse, ImError> {
        self.execute(kick_request(user_id)).await
    }
}
