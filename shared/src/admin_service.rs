use crate::http::make_boxed_error_response;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// Liveness, readiness and version probes for the admin listener.
pub struct AdminService<F, E> {
    is_ready: F,
    version: &'static str,
    _error: PhantomData<E>,
}

impl<F, E> AdminService<F, E>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F, version: &'static str) -> Self {
        Self {
            is_ready,
            version,
            _error: PhantomData,
        }
    }
}

impl<F, E, B> Service<Request<B>> for AdminService<F, E>
where
    F: Fn() -> bool + Send + 'static,
    E: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let is_ready = (self.is_ready)();
        let version = self.version;
        let is_get = req.method() == Method::GET;
        let path = req.uri().path().to_string();

        Box::pin(async move {
            let text_body = |s: String| Full::new(Bytes::from(s)).boxed();

            let res = match (is_get, path.as_str()) {
                (true, "/health") => Response::new(text_body("ok\n".into())),
                (true, "/ready") => match is_ready {
                    true => Response::new(text_body("ok\n".into())),
                    false => make_boxed_error_response(StatusCode::SERVICE_UNAVAILABLE),
                },
                (true, "/version") => Response::new(text_body(format!("{version}\n"))),
                (false, "/health" | "/ready" | "/version") => {
                    make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED)
                }
                _ => make_boxed_error_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}
