use std::env;
use std::fmt;
use std::time::Duration;

use crate::models::ImError;
use crate::usersig::DEFAULT_EXPIRE;

/// 默认的 REST API 域名（中国区）
pub const DEFAULT_BASE_URL: &str = "https://console.tim.qq.com";

/// 客户端配置，构造后不可变
///
/// 每次请求都从这里读取应用 ID、密钥和管理员账号来生成 UserSig 与请求地址。
#[derive(Clone)]
pub struct ImConfig {
    sdk_app_id: u64,
    key: String,
    identifier: String,
    base_url: String,
    sig_expire: u64,
    timeout: Option<Duration>,
}

impl ImConfig {
    /// 使用应用 ID、签名密钥和管理员账号创建配置
    pub fn new(sdk_app_id: u64, key: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            sdk_app_id,
            key: key.into(),
            identifier: identifier.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            sig_expire: DEFAULT_EXPIRE,
            timeout: None,
        }
    }

    /// 从环境变量读取配置
    ///
    /// 必填：`TENCENT_IM_SDKAPPID`、`TENCENT_IM_KEY`、`TENCENT_IM_IDENTIFIER`
    /// 选填：`TENCENT_IM_BASE_URL`、`TENCENT_IM_SIG_EXPIRE`
    pub fn from_env() -> Result<Self, ImError> {
        let sdk_app_id = required_var("TENCENT_IM_SDKAPPID")?;
        let sdk_app_id = sdk_app_id.trim().parse::<u64>().map_err(|e| {
            ImError::Config(format!("TENCENT_IM_SDKAPPID is not a number: {}", e))
        })?;
        let key = required_var("TENCENT_IM_KEY")?;
        let identifier = required_var("TENCENT_IM_IDENTIFIER")?;

        let mut config = Self::new(sdk_app_id, key, identifier);

        if let Ok(base_url) = env::var("TENCENT_IM_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Ok(expire) = env::var("TENCENT_IM_SIG_EXPIRE") {
            let expire = expire.trim().parse::<u64>().map_err(|e| {
                ImError::Config(format!("TENCENT_IM_SIG_EXPIRE is not a number: {}", e))
            })?;
            config = config.with_sig_expire(expire);
        }

        Ok(config)
    }

    /// 替换 API 域名，例如新加坡区 `https://adminapisgp.im.qcloud.com`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// UserSig 有效期（秒）
    pub fn with_sig_expire(mut self, expire: u64) -> Self {
        self.sig_expire = expire;
        self
    }

    /// 交给 HTTP 客户端的请求超时，默认不设置
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn sdk_app_id(&self) -> u64 {
        self.sdk_app_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn sig_expire(&self) -> u64 {
        self.sig_expire
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Debug for ImConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImConfig")
            .field("sdk_app_id", &self.sdk_app_id)
            .field("key", &"***")
            .field("identifier", &self.identifier)
            .field("base_url", &self.base_url)
            .field("sig_expire", &self.sig_expire)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn required_var(name: &str) -> Result<String, ImError> {
    env::var(name).map_err(|_| ImError::Config(format!("{} environment variable not set", name)))
}
