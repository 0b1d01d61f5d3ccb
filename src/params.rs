//! 请求参数构造：消息类型、消息体和额外参数的合并

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// 请求体参数表
pub type ParamMap = Map<String, Value>;

/// 当前 UNIX 时间戳（秒）
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// TIM 消息元素类型
///
/// 未列出的类型用 `Other` 原样透传，由服务端决定是否合法。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MsgType {
    /// 文本消息
    Text,
    /// 表情消息
    Face,
    /// 位置消息
    Location,
    /// 自定义消息
    Custom,
    Other(String),
}

impl MsgType {
    pub const TEXT: &'static str = "TIMTextElem";
    pub const FACE: &'static str = "TIMFaceElem";
    pub const LOCATION: &'static str = "TIMLocationElem";
    pub const CUSTOM: &'static str = "TIMCustomElem";

    pub fn as_str(&self) -> &str {
        match self {
            MsgType::Text => Self::TEXT,
            MsgType::Face => Self::FACE,
            MsgType::Location => Self::LOCATION,
            MsgType::Custom => Self::CUSTOM,
            MsgType::Other(tag) => tag,
        }
    }
}

impl From<&str> for MsgType {
    fn from(tag: &str) -> Self {
        match tag {
            Self::TEXT => MsgType::Text,
            Self::FACE => MsgType::Face,
            Self::LOCATION => MsgType::Location,
            Self::CUSTOM => MsgType::Custom,
            other => MsgType::Other(other.to_string()),
        }
    }
}

impl From<String> for MsgType {
    fn from(tag: String) -> Self {
        MsgType::from(tag.as_str())
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MsgType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MsgType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(MsgType::from(tag))
    }
}

/// 构造只含一个元素的 `MsgBody`
pub fn msg_body(msg_type: &MsgType, content: Value) -> Value {
    let mut elem = Map::new();
    elem.insert("MsgType".to_string(), Value::String(msg_type.as_str().to_string()));
    elem.insert("MsgContent".to_string(), content);
    Value::Array(vec![Value::Object(elem)])
}

/// 调用方传入的额外参数，合并时覆盖同名的默认字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(ParamMap);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置任意字段
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// 1：同步到发送方在线终端和漫游；2：不同步
    pub fn sync_other_machine(self, value: u8) -> Self {
        self.set("SyncOtherMachine", value)
    }

    /// 离线保存时长（秒），0 表示只发在线用户
    pub fn msg_life_time(self, seconds: u32) -> Self {
        self.set("MsgLifeTime", seconds)
    }

    pub fn msg_random(self, random: u32) -> Self {
        self.set("MsgRandom", random)
    }

    /// 禁止本条消息的发送前/发送后回调
    pub fn forbid_callback(self, before_send: bool, after_send: bool) -> Self {
        let mut controls = Vec::new();
        if before_send {
            controls.push(Value::from("ForbidBeforeSendMsgCallback"));
        }
        if after_send {
            controls.push(Value::from("ForbidAfterSendMsgCallback"));
        }
        self.set("ForbidCallbackControl", controls)
    }

    /// 离线推送信息，格式见消息格式描述
    pub fn offline_push_info(self, info: Value) -> Self {
        self.set("OfflinePushInfo", info)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> ParamMap {
        self.0
    }
}

impl From<ParamMap> for Options {
    fn from(map: ParamMap) -> Self {
        Options(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Options(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Options {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// 浅合并：`options` 中的键整体替换 `base` 中的同名键，不做递归合并
pub fn merge(mut base: ParamMap, options: Options) -> ParamMap {
    for (key, value) in options {
        base.insert(key, value);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_tags_round_trip() {
        assert_eq!(MsgType::from("TIMTextElem"), MsgType::Text);
        assert_eq!(MsgType::from("TIMCustomElem").as_str(), "TIMCustomElem");
        assert_eq!(MsgType::Location.to_string(), "TIMLocationElem");
    }

    #[test]
    fn unknown_tag_is_forwarded_verbatim() {
        let tag = MsgType::from("TIMSoundElem");
        assert_eq!(tag, MsgType::Other("TIMSoundElem".to_string()));
        assert_eq!(serde_json::to_value(&tag).unwrap(), json!("TIMSoundElem"));
    }

    #[test]
    fn msg_body_has_single_element() {
        let body = msg_body(&MsgType::Face, json!({"Index": 1, "Data": "content"}));
        assert_eq!(
            body,
            json!([{"MsgType": "TIMFaceElem", "MsgContent": {"Index": 1, "Data": "content"}}])
        );
    }

    #[test]
    fn merge_overrides_and_keeps_other_keys() {
        let mut base = ParamMap::new();
        base.insert("MsgRandom".into(), json!(1_700_000_000));
        base.insert("From_Account".into(), json!("admin"));

        let merged = merge(base, Options::new().msg_random(42).sync_other_machine(2));

        assert_eq!(merged["MsgRandom"], json!(42));
        assert_eq!(merged["From_Account"], json!("admin"));
        assert_eq!(merged["SyncOtherMachine"], json!(2));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn merge_is_shallow() {
        let mut base = ParamMap::new();
        base.insert("OfflinePushInfo".into(), json!({"PushFlag": 0, "Desc": "a"}));

        let merged = merge(base, Options::new().offline_push_info(json!({"Title": "t"})));

        assert_eq!(merged["OfflinePushInfo"], json!({"Title": "t"}));
    }

    #[test]
    fn merge_with_empty_options_is_identity() {
        let mut base = ParamMap::new();
        base.insert("UserID".into(), json!("user42"));
        assert_eq!(merge(base.clone(), Options::default()), base);
    }

    #[test]
    fn forbid_callback_lists_selected_controls() {
        let options = Options::new().forbid_callback(true, false);
        assert_eq!(
            options.get("ForbidCallbackControl"),
            Some(&json!(["ForbidBeforeSendMsgCallback"]))
        );
    }

    #[test]
    fn options_collect_from_pairs() {
        let options: Options = vec![("Nick", json!("Alice")), ("FaceUrl", json!("http://x"))]
            .into_iter()
            .collect();
        assert_eq!(options.len(), 2);
        assert_eq!(options.get("Nick"), Some(&json!("Alice")));
    }
}
