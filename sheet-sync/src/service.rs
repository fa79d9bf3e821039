use crate::auth::{AuthError, check_bearer};
use crate::controller::Controller;
use crate::envelope::Envelope;
use crate::errors::SyncError;
use crate::metrics_defs::REQUEST_DURATION;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use shared::histogram;
use shared::http::make_json_response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Hello,
    Status,
    List,
    Diff,
    Publish,
}

impl Endpoint {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" => Some(Endpoint::Hello),
            "/status" => Some(Endpoint::Status),
            "/list" => Some(Endpoint::List),
            "/diff" => Some(Endpoint::Diff),
            "/publish" => Some(Endpoint::Publish),
            _ => None,
        }
    }

    fn allows(&self, method: &Method) -> bool {
        match self {
            Endpoint::Publish => method == Method::GET || method == Method::POST,
            _ => method == Method::GET,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Hello => "hello",
            Endpoint::Status => "status",
            Endpoint::List => "list",
            Endpoint::Diff => "diff",
            Endpoint::Publish => "publish",
        }
    }
}

struct Inner {
    controller: Controller,
    auth_token: String,
}

/// HTTP front end for the controller. Cheap to clone.
#[derive(Clone)]
pub struct SyncService {
    inner: Arc<Inner>,
}

impl SyncService {
    pub fn new(controller: Controller, auth_token: impl Into<String>) -> Self {
        SyncService {
            inner: Arc::new(Inner {
                controller,
                auth_token: auth_token.into(),
            }),
        }
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<BoxBody<Bytes, SyncError>> {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let endpoint = Endpoint::from_path(&path);
        let auth = check_bearer(req.headers(), &self.inner.auth_token);
        drop(req);

        let (status, body) = self.dispatch(endpoint, &method, auth).await;

        histogram!(
            REQUEST_DURATION,
            "endpoint" => endpoint.map_or("unknown", |e| e.as_str()),
            "status" => status.as_str().to_string()
        )
        .record(start.elapsed().as_secs_f64());
        tracing::debug!(%method, path = %path, status = status.as_u16(), "Handled request");

        make_json_response(status, body)
    }

    async fn dispatch(
        &self,
        endpoint: Option<Endpoint>,
        method: &Method,
        auth: Result<(), AuthError>,
    ) -> (StatusCode, Vec<u8>) {
        let controller = &self.inner.controller;

        if endpoint == Some(Endpoint::Hello) && method == Method::GET {
            return to_json(StatusCode::OK, &controller.hello());
        }

        if let Err(e) = auth {
            tracing::info!(error = %e, "Rejected request");
            return to_json(StatusCode::UNAUTHORIZED, &Envelope::failure(e.to_string()));
        }

        let Some(endpoint) = endpoint else {
            return to_json(StatusCode::NOT_FOUND, &Envelope::failure("Not Found"));
        };
        if !endpoint.allows(method) {
            return to_json(
                StatusCode::METHOD_NOT_ALLOWED,
                &Envelope::failure("Method Not Allowed"),
            );
        }

        let result = match endpoint {
            Endpoint::Hello => return to_json(StatusCode::OK, &controller.hello()),
            Endpoint::Status => return to_json(StatusCode::OK, &controller.status().await),
            Endpoint::List => controller.list().await.map(|e| to_json(StatusCode::OK, &e)),
            Endpoint::Diff => controller.diff().await.map(|e| to_json(StatusCode::OK, &e)),
            Endpoint::Publish => controller
                .publish()
                .await
                .map(|e| to_json(StatusCode::OK, &e)),
        };

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, endpoint = endpoint.as_str(), "Spreadsheet read failed");
            to_json(StatusCode::BAD_GATEWAY, &Envelope::failure(e.to_string()))
        })
    }
}

fn to_json<T: Serialize>(status: StatusCode, body: &T) -> (StatusCode, Vec<u8>) {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            let e = SyncError::from(e);
            tracing::error!(error = %e, "Could not serialize response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"success":false,"errors":["Response serialization error"],"messages":[]}"#
                    .to_vec(),
            )
        }
    }
}

impl Service<Request<Incoming>> for SyncService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = SyncError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{FakeSheet, FakeStore, test_builder};
    use http_body_util::{BodyExt, Empty};
    use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
    use rules::RawRow;
    use serde_json::{Value, json};

    fn service(sheet: FakeSheet) -> SyncService {
        let controller = Controller::new(
            Arc::new(sheet),
            Arc::new(FakeStore::new(vec![])),
            test_builder(),
        );
        SyncService::new(controller, "zot")
    }

    fn request(method: Method, path: &str, token: Option<&str>) -> Request<Empty<Bytes>> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, token);
        }
        builder.body(Empty::new()).unwrap()
    }

    async fn call(service: &SyncService, req: Request<Empty<Bytes>>) -> (StatusCode, Value) {
        let response = service.handle(req).await;
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_hello_needs_no_auth() {
        let service = service(FakeSheet::with_rows(vec![]));
        let (status, body) = call(&service, request(Method::GET, "/", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"messages": [format!("directomatic {} says hello.", crate::VERSION)]})
        );
    }

    #[tokio::test]
    async fn test_auth() {
        let service = service(FakeSheet::with_rows(vec![]));

        let (status, body) = call(&service, request(Method::GET, "/list", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            json!({"success": false, "errors": ["Missing bearer token"], "messages": []})
        );

        let (status, body) = call(&service, request(Method::GET, "/list", Some("bar"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"], json!(["Invalid bearer token"]));

        // unknown paths are not revealed to unauthenticated callers
        let (status, _) = call(&service, request(Method::GET, "/nope", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_routing() {
        let service = service(FakeSheet::with_rows(vec![RawRow::new("/a", "/b")]));

        let (status, body) =
            call(&service, request(Method::GET, "/list", Some("Bearer zot"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inputRows"].as_array().unwrap().len(), 1);
        assert_eq!(body["invalidRules"], json!([]));

        let (status, body) = call(&service, request(Method::GET, "/diff", Some("zot"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["addedRules"].as_array().unwrap().len(), 1);
        assert_eq!(body["removedRules"], json!([]));

        let (status, body) = call(&service, request(Method::GET, "/status", Some("zot"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));

        let (status, body) = call(&service, request(Method::POST, "/publish", Some("zot"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], json!("succeeded"));

        let (status, _) = call(&service, request(Method::GET, "/publish", Some("zot"))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&service, request(Method::GET, "/nope", Some("zot"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&service, request(Method::POST, "/list", Some("zot"))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_sheet_failure_is_bad_gateway() {
        let service = service(FakeSheet::failing());
        let (status, body) = call(&service, request(Method::GET, "/diff", Some("zot"))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body["errors"],
            json!(["Google Sheet API returned 500, Internal Server Error"])
        );
    }
}
