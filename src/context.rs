//! The per-request [`Context`] handed to every handler in a chain.
//!
//! A context is created for each request, walks the matched handler chain
//! and is turned into the response once the chain returns. Handlers continue
//! the chain explicitly with [`Context::next`]; a handler that does not call
//! it ends the chain early.
//!
//! ```rust
//! use fitrouter::{Context, Router};
//! use hyper::StatusCode;
//!
//! fn authorize(c: &mut Context<'_>) {
//!     if c.param("user") != Some("gordon") {
//!         let _ = c.text(StatusCode::UNAUTHORIZED, "go away");
//!         return;
//!     }
//!     c.shared().set("role", "admin");
//!     c.next();
//! }
//!
//! fn profile(c: &mut Context<'_>) {
//!     let role = c.shared().get::<&str>("role").copied().unwrap_or("guest");
//!     let _ = c.text(StatusCode::OK, format!("role: {}", role));
//! }
//!
//! # fn main() -> Result<(), fitrouter::InsertError> {
//! let mut router = Router::default();
//! router.get("/profile/:user", vec![authorize as fn(&mut Context<'_>), profile])?;
//! # Ok(())
//! # }
//! ```
use crate::error::ResponseError;
use crate::params::Params;
use crate::router::Handler;

use std::any::Any;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;

use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{Body, HeaderMap, Request, Response, StatusCode};
use serde::Serialize;

/// Request-scoped state shared between the handlers of one chain.
#[derive(Default)]
pub struct Shared {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Shared {
    /// Returns the value stored under `key`, if there is one of type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        let value = self.values.get(key).and_then(|v| v.downcast_ref::<T>());
        if value.is_none() {
            tracing::trace!(key, "no shared value of the requested type");
        }
        value
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Whether a value of any type is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes the value stored under `key`, returning whether there was one.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// The state of a single request as it moves through its handler chain.
pub struct Context<'r> {
    chain: Vec<&'r dyn Handler>,
    // `None` until the first handler runs
    cursor: Option<usize>,
    request: Request<Body>,
    params: Params,
    shared: Option<Shared>,
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
    finalized: bool,
}

impl<'r> Context<'r> {
    pub(crate) fn new(request: Request<Body>, chain: Vec<&'r dyn Handler>, params: Params) -> Self {
        Self {
            chain,
            cursor: None,
            request,
            params,
            shared: None,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Body::empty(),
            finalized: false,
        }
    }

    /// Calls the next handler in the chain and returns once it has returned.
    ///
    /// Returns `false`, without doing anything, if the chain has no handler left.
    pub fn next(&mut self) -> bool {
        let next = self.cursor.map_or(0, |i| i + 1);

        match self.chain.get(next).copied() {
            Some(handler) => {
                self.cursor = Some(next);
                handler.handle(self);
                true
            }
            None => {
                tracing::trace!(
                    path = self.request.uri().path(),
                    "no handler left in the chain, next() has no effect"
                );
                false
            }
        }
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    /// The parameters captured from the request path.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Shorthand for `self.params().get(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// The request-scoped store, created on first use.
    pub fn shared(&mut self) -> &mut Shared {
        self.shared.get_or_insert_with(Shared::default)
    }

    /// The status of the response, `200 OK` unless a handler or the router
    /// has set another.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Whether the response has already been written.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Adds a header to the response. Must be called before the response is
    /// written.
    pub fn header(&mut self, name: &str, value: &str) -> Result<&mut Self, ResponseError> {
        if self.finalized {
            return Err(self.refuse());
        }

        let name = HeaderName::try_from(name).map_err(hyper::http::Error::from)?;
        let value = HeaderValue::try_from(value).map_err(hyper::http::Error::from)?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Writes a plain response with the given status.
    pub fn text(&mut self, status: StatusCode, body: impl Into<Body>) -> Result<(), ResponseError> {
        self.finalize(status, None, body.into())
    }

    /// Serializes `data` as JSON and writes it with the given status.
    ///
    /// If serialization fails, a `500 Internal Server Error` carrying the
    /// error's description is written instead.
    pub fn json<T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        data: &T,
    ) -> Result<(), ResponseError> {
        match serde_json::to_vec(data) {
            Ok(body) => self.finalize(status, Some("application/json"), body.into()),
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode response body");
                self.finalize(StatusCode::INTERNAL_SERVER_ERROR, None, err.to_string().into())
            }
        }
    }

    /// Writes a redirect to `location`.
    pub fn redirect(&mut self, status: StatusCode, location: &str) -> Result<(), ResponseError> {
        if self.finalized {
            return Err(self.refuse());
        }

        let location = HeaderValue::try_from(location).map_err(hyper::http::Error::from)?;
        self.headers.insert(LOCATION, location);
        self.finalize(status, None, Body::empty())
    }

    fn finalize(
        &mut self,
        status: StatusCode,
        content_type: Option<&'static str>,
        body: Body,
    ) -> Result<(), ResponseError> {
        if self.finalized {
            return Err(self.refuse());
        }

        if let Some(content_type) = content_type {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }

        self.status = status;
        self.body = body;
        self.finalized = true;
        Ok(())
    }

    fn refuse(&self) -> ResponseError {
        tracing::error!(
            path = self.request.uri().path(),
            status = self.status.as_u16(),
            "response already written, keeping the first one"
        );
        ResponseError::AlreadyFinalized
    }

    pub(crate) fn into_response(self) -> Response<Body> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.request.uri().path())
            .field("handlers", &self.chain.len())
            .field("cursor", &self.cursor)
            .field("params", &self.params)
            .field("shared", &self.shared)
            .field("status", &self.status)
            .field("finalized", &self.finalized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request() -> Request<Body> {
        Request::get("/a/route").body(Body::empty()).unwrap()
    }

    fn run<'r>(chain: Vec<&'r dyn Handler>) -> Context<'r> {
        let mut ctx = Context::new(request(), chain, Params::default());
        ctx.next();
        ctx
    }

    #[test]
    fn middleware_and_shared() {
        let first = |c: &mut Context<'_>| {
            c.shared().set("teststring", String::from("Some string value"));
            c.shared().set("testinteger", 5325);

            assert_eq!(
                c.shared().get::<String>("teststring").map(String::as_str),
                Some("Some string value")
            );
            assert_eq!(c.shared().get::<i32>("testinteger"), Some(&5325));

            assert!(c.next());
        };

        let second = |c: &mut Context<'_>| {
            assert_eq!(
                c.shared().get::<String>("teststring").map(String::as_str),
                Some("Some string value")
            );
            assert_eq!(c.shared().get::<i32>("testinteger"), Some(&5325));
            assert!(c.shared().get::<i32>("thisdoesnotexist").is_none());
            // stored as an i32, not a u64
            assert!(c.shared().get::<u64>("testinteger").is_none());

            assert!(c.shared().contains("testinteger"));
            assert!(c.shared().remove("testinteger"));
            assert!(!c.shared().remove("testinteger"));
            assert!(!c.shared().contains("testinteger"));

            assert!(!c.next());
            c.shared().set("second", true);
        };

        let mut ctx = run(vec![&first as &dyn Handler, &second]);
        assert_eq!(ctx.shared().get::<bool>("second"), Some(&true));
    }

    #[test]
    fn chain_runs_in_order() {
        let calls = AtomicUsize::new(0);
        let step = |expected: usize| {
            let calls = &calls;
            move |c: &mut Context<'_>| {
                assert_eq!(calls.fetch_add(1, Ordering::SeqCst), expected);
                c.next();
            }
        };

        let (a, b, c) = (step(0), step(1), step(2));
        run(vec![&a as &dyn Handler, &b, &c]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn short_circuit() {
        let reached = AtomicUsize::new(0);
        let reject = |c: &mut Context<'_>| {
            c.text(StatusCode::UNAUTHORIZED, "no").unwrap();
        };
        let handler = |_: &mut Context<'_>| {
            reached.fetch_add(1, Ordering::SeqCst);
        };

        let ctx = run(vec![&reject as &dyn Handler, &handler]);
        assert_eq!(reached.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn next_past_the_end() {
        let calls = AtomicUsize::new(0);
        let handler = |_: &mut Context<'_>| {
            calls.fetch_add(1, Ordering::SeqCst);
        };

        let mut ctx = run(vec![&handler as &dyn Handler]);
        for _ in 0..5 {
            assert!(!ctx.next());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let mut empty = run(Vec::new());
        assert!(!empty.next());
    }

    #[test]
    fn params() {
        let params = Params::from(vec![("id", "22"), ("name", "John")]);
        let ctx = Context::new(request(), Vec::new(), params);

        assert_eq!(ctx.param("id"), Some("22"));
        assert_eq!(ctx.params().get("name"), Some("John"));
        assert_eq!(ctx.param("doesnotexist"), None);
    }

    #[test]
    fn finalize_once() {
        let mut ctx = Context::new(request(), Vec::new(), Params::default());
        assert_eq!(ctx.status(), StatusCode::OK);
        assert!(!ctx.is_finalized());

        ctx.text(StatusCode::IM_A_TEAPOT, "short and stout").unwrap();
        assert!(matches!(
            ctx.text(StatusCode::OK, "again"),
            Err(ResponseError::AlreadyFinalized)
        ));
        assert!(matches!(
            ctx.json(StatusCode::OK, &"again"),
            Err(ResponseError::AlreadyFinalized)
        ));
        assert!(ctx.header("x-late", "1").is_err());

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(response.headers().get("x-late").is_none());
    }

    #[test]
    fn json() {
        let mut ctx = Context::new(request(), Vec::new(), Params::default());
        let mut body = BTreeMap::new();
        body.insert("message", "Hey, it worked!");

        ctx.header("x-request", "1").unwrap();
        ctx.json(StatusCode::CREATED, &body).unwrap();

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()["x-request"], "1");
    }

    #[test]
    fn json_encoding_failure() {
        // JSON object keys must be strings
        let mut data = BTreeMap::new();
        data.insert(vec![1u8], "value");

        let mut ctx = Context::new(request(), Vec::new(), Params::default());
        ctx.json(StatusCode::OK, &data).unwrap();
        assert!(ctx.is_finalized());
        assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn redirect() {
        let mut ctx = Context::new(request(), Vec::new(), Params::default());
        ctx.redirect(StatusCode::MOVED_PERMANENTLY, "/photos").unwrap();

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/photos");
    }

    #[test]
    fn invalid_header() {
        let mut ctx = Context::new(request(), Vec::new(), Params::default());
        assert!(matches!(
            ctx.header("bad header", "1"),
            Err(ResponseError::InvalidHeader(_))
        ));
        assert!(!ctx.is_finalized());
    }
}
