//! UserSig（TLS 签名 v2）生成与校验
//!
//! 签名流程：
//! 1. 拼接 `TLS.identifier / TLS.sdkappid / TLS.time / TLS.expire` 四行文本
//! 2. 用密钥做 HMAC-SHA256，结果 base64 后写入 `TLS.sig`
//! 3. 整个 JSON 文档 zlib 压缩后 base64，并把 `+ / =` 替换为 `* - _`

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::models::ImError;
use crate::params::unix_now;

type HmacSha256 = Hmac<Sha256>;

/// 默认有效期：180 天
pub const DEFAULT_EXPIRE: u64 = 86400 * 180;

const SIG_VERSION: &str = "2.0";

/// 解码后的签名内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSigInfo {
    pub identifier: String,
    pub sdk_app_id: u64,
    pub time: u64,
    pub expire: u64,
}

#[derive(Deserialize)]
struct SigDoc {
    #[serde(rename = "TLS.ver")]
    ver: String,
    #[serde(rename = "TLS.identifier")]
    identifier: String,
    #[serde(rename = "TLS.sdkappid")]
    sdk_app_id: u64,
    #[serde(rename = "TLS.expire")]
    expire: u64,
    #[serde(rename = "TLS.time")]
    time: u64,
    #[serde(rename = "TLS.sig")]
    sig: String,
}

/// 以当前时间生成 UserSig
pub fn gen_user_sig(
    sdk_app_id: u64,
    key: &str,
    identifier: &str,
    expire: u64,
) -> Result<String, ImError> {
    gen_user_sig_at(sdk_app_id, key, identifier, expire, unix_now())
}

/// 以指定签发时间生成 UserSig
pub fn gen_user_sig_at(
    sdk_app_id: u64,
    key: &str,
    identifier: &str,
    expire: u64,
    time: u64,
) -> Result<String, ImError> {
    let sig = STANDARD.encode(hmac_sha256(key, identifier, sdk_app_id, time, expire)?);

    let doc = json!({
        "TLS.ver": SIG_VERSION,
        "TLS.identifier": identifier,
        "TLS.sdkappid": sdk_app_id,
        "TLS.expire": expire,
        "TLS.time": time,
        "TLS.sig": sig,
    });
    let raw = serde_json::to_vec(&doc).map_err(|e| ImError::Signature(e.to_string()))?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&raw)
        .map_err(|e| ImError::Signature(format!("zlib compress failed: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| ImError::Signature(format!("zlib compress failed: {}", e)))?;

    Ok(base64_url_encode(&compressed))
}

/// 解码并校验 UserSig：密钥、应用 ID、账号必须一致，且在 `now` 时刻未过期
pub fn verify_user_sig(
    user_sig: &str,
    sdk_app_id: u64,
    key: &str,
    identifier: &str,
    now: u64,
) -> Result<UserSigInfo, ImError> {
    let compressed = base64_url_decode(user_sig)?;

    let mut raw = Vec::new();
    ZlibDecoder::new(&compressed[..])
        .read_to_end(&mut raw)
        .map_err(|e| ImError::Signature(format!("zlib decompress failed: {}", e)))?;

    let doc: SigDoc = serde_json::from_slice(&raw)
        .map_err(|e| ImError::Signature(format!("malformed signature document: {}", e)))?;

    if doc.ver != SIG_VERSION {
        return Err(ImError::Signature(format!("unsupported version {}", doc.ver)));
    }
    if doc.sdk_app_id != sdk_app_id {
        return Err(ImError::Signature("sdkappid mismatch".to_string()));
    }
    if doc.identifier != identifier {
        return Err(ImError::Signature("identifier mismatch".to_string()));
    }

    let expected = STANDARD
        .decode(doc.sig.as_bytes())
        .map_err(|e| ImError::Signature(format!("invalid TLS.sig: {}", e)))?;
    let mut mac = new_mac(key)?;
    mac.update(sign_content(&doc.identifier, doc.sdk_app_id, doc.time, doc.expire).as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| ImError::Signature("hmac mismatch".to_string()))?;

    if doc.time.saturating_add(doc.expire) < now {
        return Err(ImError::Signature("signature expired".to_string()));
    }

    Ok(UserSigInfo {
        identifier: doc.identifier,
        sdk_app_id: doc.sdk_app_id,
        time: doc.time,
        expire: doc.expire,
    })
}

fn sign_content(identifier: &str, sdk_app_id: u64, time: u64, expire: u64) -> String {
    format!(
        "TLS.identifier:{}\nTLS.sdkappid:{}\nTLS.time:{}\nTLS.expire:{}\n",
        identifier, sdk_app_id, time, expire
    )
}

fn new_mac(key: &str) -> Result<HmacSha256, ImError> {
    HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| ImError::Signature(e.to_string()))
}

fn hmac_sha256(
    key: &str,
    identifier: &str,
    sdk_app_id: u64,
    time: u64,
    expire: u64,
) -> Result<Vec<u8>, ImError> {
    let mut mac = new_mac(key)?;
    mac.update(sign_content(identifier, sdk_app_id, time, expire).as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn base64_url_encode(data: &[u8]) -> String {
    STANDARD
        .encode(data)
        .chars()
        .map(|c| match c {
            '+' => '*',
            '/' => '-',
            '=' => '_',
            other => other,
        })
        .collect()
}

fn base64_url_decode(data: &str) -> Result<Vec<u8>, ImError> {
    let standard: String = data
        .chars()
        .map(|c| match c {
            '*' => '+',
            '-' => '/',
            '_' => '=',
            other => other,
        })
        .collect();
    STANDARD
        .decode(standard.as_bytes())
        .map_err(|e| ImError::Signature(format!("invalid base64: {}", e)))
}
