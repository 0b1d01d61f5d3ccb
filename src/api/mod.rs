//! 各接口的请求构造与调用
//!
//! 每个接口都拆成两步：`*_request` 函数只构造 [`ImRequest`]，不访问网络；
//! [`ImClient`](crate::ImClient) 上的同名方法负责发送。

pub mod account;
pub mod openim;

pub use account::*;
pub use openim::*;

use serde_json::Value;

use crate::params::ParamMap;

/// `[{"UserID": ..}, ..]`，保持原有顺序
fn user_id_items<S: AsRef<str>>(accounts: &[S]) -> Value {
    Value::Array(
        accounts
            .iter()
            .map(|account| {
                let mut item = ParamMap::new();
                item.insert("UserID".to_string(), Value::from(account.as_ref()));
                Value::Object(item)
            })
            .collect(),
    )
}

fn string_list<S: AsRef<str>>(items: &[S]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(s.as_ref())).collect())
}
