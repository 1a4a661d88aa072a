//! # 请求派发
//!
//! 根据 `EndpointKey` 查出接口描述，把调用方参数浅合并到默认参数之上，
//! 再交给 `Transport` 发送。合并只做一层：同名字段整体覆盖，嵌套对象不会递归合并。
//!
//! 这里不做重试、超时和取消，传输层的错误原样返回给调用方。

use crate::error::{AppError, AppResult};
use crate::models::Envelope;
use crate::registry::{EndpointKey, Method, ParamContext};
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub type Params = Map<String, Value>;

/// 真正发出网络请求的协作方。
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        params: Params,
        options: Params,
    ) -> BoxFuture<'a, AppResult<Envelope>>;
}

/// 提供默认参数和鉴权令牌的会话来源，通常是 `UserStore`。
pub trait SessionSource: Send + Sync {
    fn param_context(&self) -> ParamContext;

    fn token(&self) -> Option<String> {
        None
    }
}

impl SessionSource for ParamContext {
    fn param_context(&self) -> ParamContext {
        self.clone()
    }
}

/// 带类型的请求参数，编译期绑定到唯一的接口。
pub trait Operation: Serialize {
    const KEY: EndpointKey;
}

/// 浅合并：`overrides` 中的键整体覆盖 `base` 中的同名键。
pub fn merge_shallow(mut base: Params, overrides: Params) -> Params {
    for (key, value) in overrides {
        base.insert(key, value);
    }
    base
}

/// 把任意可序列化的值转为参数表，必须是 JSON 对象。
pub fn to_params<T: Serialize + ?Sized>(value: &T) -> AppResult<Params> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Params::new()),
        other => Err(AppError::InvalidParams(format!(
            "参数必须是 JSON 对象, 实际为 {}",
            other
        ))),
    }
}

/// 合并完成、即将交给传输层的请求。
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRequest {
    pub key: EndpointKey,
    pub method: Method,
    pub path: &'static str,
    pub params: Params,
    pub options: Params,
}

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionSource>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<dyn SessionSource>) -> Self {
        Dispatcher { transport, session }
    }

    /// 只计算最终的方法、路径、参数和选项，不发送。
    pub fn resolve(
        &self,
        key: EndpointKey,
        params: Option<Params>,
        options: Option<Params>,
    ) -> ResolvedRequest {
        let spec = key.spec(&self.session.param_context());
        ResolvedRequest {
            key,
            method: spec.method,
            path: spec.path,
            params: merge_shallow(spec.default_params, params.unwrap_or_default()),
            options: merge_shallow(spec.options, options.unwrap_or_default()),
        }
    }

    pub async fn call(
        &self,
        key: EndpointKey,
        params: Option<Params>,
        options: Option<Params>,
    ) -> AppResult<Envelope> {
        let request = self.resolve(key, params, options);
        let request_id = Uuid::new_v4();
        debug!(
            %request_id,
            endpoint = %request.key,
            method = %request.method,
            path = request.path,
            "dispatching request"
        );

        let result = self
            .transport
            .send(request.method, request.path, request.params, request.options)
            .await;

        match &result {
            Ok(envelope) => debug!(%request_id, code = envelope.code, "request finished"),
            Err(e) => warn!(%request_id, endpoint = %key, "request failed: {}", e),
        }
        result
    }

    /// 带类型的调用入口，参数结构决定调用哪个接口。
    pub async fn send<O: Operation>(&self, op: &O, options: Option<Params>) -> AppResult<Envelope> {
        let params = to_params(op)?;
        self.call(O::KEY, Some(params), options).await
    }

    /// 按字符串名调用，供命令行等动态入口使用。
    pub async fn call_by_name(
        &self,
        name: &str,
        params: Option<Params>,
        options: Option<Params>,
    ) -> AppResult<Envelope> {
        let key: EndpointKey = name.parse()?;
        self.call(key, params, options).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingTransport;
    use super::*;
    use serde_json::json;

    fn session() -> Arc<dyn SessionSource> {
        Arc::new(ParamContext {
            user_id: "u1".to_string(),
            user_info: "13800000000".to_string(),
        })
    }

    fn params(value: Value) -> Params {
        to_params(&value).unwrap()
    }

    #[test]
    fn merge_is_shallow_and_override_wins() {
        let merged = merge_shallow(params(json!({ "a": 0, "b": 2 })), params(json!({ "a": 1 })));
        assert_eq!(Value::Object(merged), json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn merge_replaces_nested_objects_wholesale() {
        let merged = merge_shallow(
            params(json!({ "filter": { "kb": "x", "page": 1 } })),
            params(json!({ "filter": { "page": 2 } })),
        );
        assert_eq!(Value::Object(merged), json!({ "filter": { "page": 2 } }));
    }

    #[test]
    fn to_params_rejects_non_objects() {
        assert!(matches!(to_params(&json!([1, 2])), Err(AppError::InvalidParams(_))));
        assert!(to_params(&Value::Null).unwrap().is_empty());
    }

    #[tokio::test]
    async fn every_key_uses_its_method_and_path() {
        let transport = RecordingTransport::with_replies(Vec::new());
        let dispatcher = Dispatcher::new(transport.clone(), session());

        for key in EndpointKey::ALL {
            dispatcher.call(*key, None, None).await.unwrap();
        }

        let calls = transport.calls.lock();
        assert_eq!(calls.len(), EndpointKey::ALL.len());
        for (key, (method, path, _, _)) in EndpointKey::ALL.iter().zip(calls.iter()) {
            assert_eq!(*method, key.method(), "{key}");
            assert_eq!(path, key.path(), "{key}");
        }
    }

    #[tokio::test]
    async fn caller_params_and_options_override_defaults() {
        let transport = RecordingTransport::with_replies(Vec::new());
        let dispatcher = Dispatcher::new(transport.clone(), session());

        dispatcher
            .call(
                EndpointKey::FileList,
                Some(params(json!({ "kb_id": "KB9", "page": 3 }))),
                Some(params(json!({ "showLoading": false }))),
            )
            .await
            .unwrap();

        let calls = transport.calls.lock();
        let (_, _, sent, options) = &calls[0];
        assert_eq!(
            Value::Object(sent.clone()),
            json!({ "user_id": "u1", "user_info": "13800000000", "kb_id": "KB9", "page": 3 })
        );
        assert_eq!(options["showLoading"], json!(false));
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let transport = RecordingTransport::with_replies(vec![Err(AppError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        })]);
        let dispatcher = Dispatcher::new(transport, session());
        let err = dispatcher.call(EndpointKey::KbList, None, None).await.unwrap_err();
        assert!(matches!(err, AppError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn unknown_name_is_rejected_before_sending() {
        let transport = RecordingTransport::with_replies(Vec::new());
        let dispatcher = Dispatcher::new(transport.clone(), session());
        let err = dispatcher.call_by_name("dropDatabase", None, None).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownEndpoint(_)));
        assert!(transport.calls.lock().is_empty());
    }
}
