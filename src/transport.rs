//! 基于 `reqwest` 的 HTTP 传输层。
//!
//! GET 请求把参数放进查询串，POST 请求以 JSON 作为请求体。
//! 会话中有令牌时附带 `Authorization: Bearer <token>`。

use crate::dispatcher::{Params, SessionSource, Transport};
use crate::error::{AppError, AppResult};
use crate::models::Envelope;
use crate::registry::Method;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionSource>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, session: Arc<dyn SessionSource>) -> Self {
        Self::with_client(base_url, session, reqwest::Client::new())
    }

    /// 使用调用方配置好的客户端（超时、代理等）
    pub fn with_client(
        base_url: impl Into<String>,
        session: Arc<dyn SessionSource>,
        client: reqwest::Client,
    ) -> Self {
        HttpTransport {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        params: Params,
        options: Params,
    ) -> AppResult<Envelope> {
        let url = self.url(path);
        let mut builder = match method {
            Method::Get => self.client.get(&url).query(&query_pairs(&params)),
            Method::Post => self.client.post(&url).json(&params),
        };

        if let Some(token) = self.session.token().filter(|t| !t.is_empty()) {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        // 只识别 headers，其余选项（showLoading 等）属于界面层
        if let Some(Value::Object(headers)) = options.get("headers") {
            for (name, value) in headers {
                if let Some(value) = value.as_str() {
                    builder = builder.header(name.as_str(), value);
                }
            }
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%url, status = status.as_u16(), "response received");

        match serde_json::from_str::<Envelope>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(AppError::Status {
                status: status.as_u16(),
                body,
            }),
            Err(e) => Err(AppError::Json(e)),
        }
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        params: Params,
        options: Params,
    ) -> BoxFuture<'a, AppResult<Envelope>> {
        Box::pin(self.execute(method, path, params, options))
    }
}

/// 把参数表转为查询串。字符串原样保留，`null` 跳过，其它值按 JSON 文本编码。
pub fn query_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key.clone(), text.clone())),
            other => Some((key.clone(), other.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ParamContext;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    struct TokenSession(Option<String>);

    impl SessionSource for TokenSession {
        fn param_context(&self) -> ParamContext {
            ParamContext::default()
        }

        fn token(&self) -> Option<String> {
            self.0.clone()
        }
    }

    /// 收到的原始请求：请求行、小写的头部名称和请求体
    struct Captured {
        request_line: String,
        headers: Vec<(String, String)>,
        body: String,
    }

    impl Captured {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }
    }

    /// 只应答一次的本地 HTTP 服务，返回基地址和收到的请求
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let captured = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            captured
        });
        (format!("http://{}/api", addr), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> Captured {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }

        let text = String::from_utf8_lossy(&buf).into_owned();
        let (head, body) = text.split_once("\r\n\r\n").unwrap_or((text.as_str(), ""));
        let mut lines = head.lines();
        let request_line = lines.next().unwrap_or_default().to_string();
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_string()))
            .collect();
        Captured {
            request_line,
            headers,
            body: body.to_string(),
        }
    }

    fn transport(base_url: String, token: Option<&str>) -> HttpTransport {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpTransport::with_client(
            base_url,
            Arc::new(TokenSession(token.map(str::to_string))),
            client,
        )
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn get_sends_query_string_without_token() {
        let (base, server) = serve_once("200 OK", r#"{"code":200,"data":[],"msg":"ok"}"#).await;

        let envelope = transport(base, None)
            .send(
                Method::Get,
                "/user/list",
                params(json!({ "user_id": "u1", "page": 2, "dept_id": null })),
                Params::new(),
            )
            .await
            .unwrap();

        assert!(envelope.is_success());
        let captured = server.await.unwrap();
        assert_eq!(captured.request_line, "GET /api/user/list?page=2&user_id=u1 HTTP/1.1");
        assert!(captured.header("authorization").is_none());
        assert!(captured.body.is_empty());
    }

    #[tokio::test]
    async fn post_sends_json_body_with_bearer_and_extra_headers() {
        let (base, server) = serve_once("200 OK", r#"{"code":"200","data":{"kb_id":"KB1"}}"#).await;

        let envelope = transport(base, Some("jwt"))
            .send(
                Method::Post,
                "/local_doc_qa/new_knowledge_base",
                params(json!({ "user_id": "u1", "kb_name": "手册" })),
                params(json!({ "showLoading": true, "headers": { "X-Trace": "t-1" } })),
            )
            .await
            .unwrap();

        assert_eq!(envelope.code, Envelope::SUCCESS);
        assert_eq!(envelope.data["kb_id"], json!("KB1"));

        let captured = server.await.unwrap();
        assert_eq!(
            captured.request_line,
            "POST /api/local_doc_qa/new_knowledge_base HTTP/1.1"
        );
        assert_eq!(captured.header("authorization"), Some("Bearer jwt"));
        assert_eq!(captured.header("x-trace"), Some("t-1"));
        assert!(captured.header("showloading").is_none());
        assert!(captured
            .header("content-type")
            .is_some_and(|value| value.starts_with("application/json")));
        let body: Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(body, json!({ "user_id": "u1", "kb_name": "手册" }));
    }

    #[tokio::test]
    async fn empty_token_sends_no_authorization() {
        let (base, server) = serve_once("200 OK", r#"{"code":200}"#).await;

        transport(base, Some(""))
            .send(Method::Post, "/auth/login", Params::new(), Params::new())
            .await
            .unwrap();

        assert!(server.await.unwrap().header("authorization").is_none());
    }

    #[tokio::test]
    async fn error_status_with_envelope_is_returned_as_envelope() {
        let (base, server) =
            serve_once("500 Internal Server Error", r#"{"code":500,"msg":"数据库不可用"}"#).await;

        let envelope = transport(base, None)
            .send(Method::Post, "/user/list_knowledge_base", Params::new(), Params::new())
            .await
            .unwrap();

        assert_eq!(envelope.code, Envelope::SERVER_ERROR);
        assert_eq!(envelope.msg, "数据库不可用");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn error_status_without_envelope_is_a_status_error() {
        let (base, server) = serve_once("502 Bad Gateway", "bad gateway").await;

        let err = transport(base, None)
            .send(Method::Get, "/user/list", Params::new(), Params::new())
            .await
            .unwrap_err();

        match err {
            AppError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn success_status_with_foreign_body_is_a_json_error() {
        let (base, server) = serve_once("200 OK", "<html></html>").await;

        let err = transport(base, None)
            .send(Method::Get, "/user/list", Params::new(), Params::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Json(_)));
        server.await.unwrap();
    }

    #[test]
    fn query_pairs_flattens_values() {
        let params = match json!({
            "user_id": "u1",
            "page": 2,
            "dept_id": null,
            "ids": ["a", "b"]
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let mut pairs = query_pairs(&params);
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("ids".to_string(), "[\"a\",\"b\"]".to_string()),
                ("page".to_string(), "2".to_string()),
                ("user_id".to_string(), "u1".to_string()),
            ]
        );
    }

    #[test]
    fn url_joins_base_and_path() {
        let transport = HttpTransport::new(
            "http://localhost:8777/api/",
            Arc::new(ParamContext::default()),
        );
        assert_eq!(
            transport.url("/user/list"),
            "http://localhost:8777/api/user/list"
        );
    }
}
