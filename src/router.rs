//! [`Router`](crate::Router) dispatches requests to chains of handlers.
//!
//! Routes are stored in a compressing dynamic trie (radix tree), so a
//! lookup costs one pass over the request path no matter how many routes
//! are registered.
//!
//! The registered path, against which the router matches incoming requests, can
//! contain two types of parameters:
//! ```ignore
//!  Syntax    Type
//!  :name     named parameter
//!  *name     catch-all parameter
//! ```
//!
//! Named parameters are dynamic path segments. They match anything until the
//! next '/' or the path end:
//! ```ignore
//!  Path: /blog/:category/:post
//! ```
//!
//!  Requests:
//! ```ignore
//!   /blog/rust/request-routers            match: category="rust", post="request-routers"
//!   /blog/rust/request-routers/           no match, but the router would redirect
//!   /blog/rust/                           no match
//!   /blog/rust/request-routers/comments   no match
//! ```
//!
//! Catch-all parameters match anything until the path end. Since they match
//! anything until the end, catch-all parameters must always be the final path
//! element.
//! ```ignore
//!  Path: /files/*filepath
//!
//!  Requests:
//!   /files/LICENSE                      match: filepath="LICENSE"
//!   /files/templates/article.html       match: filepath="templates/article.html"
//!   /files/                             no match
//! ```
//!
//! A static segment and a parameter can not share a position: `/user/new`
//! and `/user/:user` can not both be registered. Such a registration is
//! rejected with an [`InsertError`](crate::InsertError).
use crate::context::Context;
use crate::defaults;
use crate::error::InsertError;
use crate::options::RouteOptions;
use crate::params::Params;
use crate::path::toggle_trailing_slash;
use crate::tree::{Match, Node};

use std::fmt;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures_util::future;
use hyper::service::Service;
use hyper::{Body, Method, Request, Response, StatusCode};

/// A handler chain registered for one path and method.
pub type Chain = Vec<Arc<dyn Handler>>;

/// Router dispatches requests to different handler chains via configurable routes.
pub struct Router {
    tree: Node<Chain>,
    before: Chain,
    after: Chain,
    not_found: Box<dyn Handler>,
    logger: Option<Box<dyn Handler>>,
    redirect_slashes: bool,
}

/// The outcome of resolving a request against a [`Router`].
pub enum Route<'r> {
    /// A non-empty handler chain was registered for the path and method.
    Found {
        handlers: &'r [Arc<dyn Handler>],
        params: Params,
    },
    /// The path with its trailing slash toggled would match; the client
    /// should be sent there with `301 Moved Permanently`.
    Redirect(String),
    NotFound,
}

impl Router {
    /// Registers a chain of handlers for a path and a set of methods.
    ///
    /// Handlers run in the given order; each continues the chain by calling
    /// [`Context::next`]. The returned options can be used to name the route
    /// and constrain its parameters.
    /// ```rust
    /// use fitrouter::{Context, Router};
    /// use hyper::{Method, StatusCode};
    ///
    /// # fn main() -> Result<(), fitrouter::InsertError> {
    /// let mut router = Router::default();
    /// router.handle("/teapot", &[Method::GET, Method::POST], vec![|c: &mut Context<'_>| {
    ///     let _ = c.text(StatusCode::IM_A_TEAPOT, "I am a teapot!");
    /// }])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn handle<H>(
        &mut self,
        path: &str,
        methods: &[Method],
        handlers: impl IntoIterator<Item = H>,
    ) -> Result<&mut RouteOptions, InsertError>
    where
        H: Handler + 'static,
    {
        let chain: Chain = handlers
            .into_iter()
            .map(|h| Arc::new(h) as Arc<dyn Handler>)
            .collect();

        tracing::debug!(path, ?methods, handlers = chain.len(), "registering route");
        self.tree.insert(path, methods, chain)
    }

    /// Register a handler chain for `GET` requests
    pub fn get<H: Handler + 'static>(
        &mut self,
        path: &str,
        handlers: impl IntoIterator<Item = H>,
    ) -> Result<&mut RouteOptions, InsertError> {
        self.handle(path, &[Method::GET], handlers)
    }

    /// Register a handler chain for `HEAD` requests
    pub fn head<H: Handler + 'static>(
        &mut self,
        path: &str,
        handlers: impl IntoIterator<Item = H>,
    ) -> Result<&mut RouteOptions, InsertError> {
        self.handle(path, &[Method::HEAD], handlers)
    }

    /// Register a handler chain for `OPTIONS` requests
    pub fn options<H: Handler + 'static>(
        &mut self,
        path: &str,
        handlers: impl IntoIterator<Item = H>,
    ) -> Result<&mut RouteOptions, InsertError> {
        self.handle(path, &[Method::OPTIONS], handlers)
    }

    /// Register a handler chain for `POST` requests
    pub fn post<H: Handler + 'static>(
        &mut self,
        path: &str,
        handlers: impl IntoIterator<Item = H>,
    ) -> Result<&mut RouteOptions, InsertError> {
        self.handle(path, &[Method::POST], handlers)
    }

    /// Register a handler chain for `PUT` requests
    pub fn put<H: Handler + 'static>(
        &mut self,
        path: &str,
        handlers: impl IntoIterator<Item = H>,
    ) -> Result<&mut RouteOptions, InsertError> {
        self.handle(path, &[Method::PUT], handlers)
    }

    /// Register a handler chain for `PATCH` requests
    pub fn patch<H: Handler + 'static>(
        &mut self,
        path: &str,
        handlers: impl IntoIterator<Item = H>,
    ) -> Result<&mut RouteOptions, InsertError> {
        self.handle(path, &[Method::PATCH], handlers)
    }

    /// Register a handler chain for `DELETE` requests
    pub fn delete<H: Handler + 'static>(
        &mut self,
        path: &str,
        handlers: impl IntoIterator<Item = H>,
    ) -> Result<&mut RouteOptions, InsertError> {
        self.handle(path, &[Method::DELETE], handlers)
    }

    /// Adds a handler that runs before the registered chain of every matched route.
    pub fn before(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.before.push(Arc::new(handler));
        self
    }

    /// Adds a handler that runs after the registered chain of every matched
    /// route, provided the chain gets that far.
    pub fn after(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.after.push(Arc::new(handler));
        self
    }

    /// Enables or disables automatic redirection if the current route can't be
    /// matched but a handler for the path with (without) the trailing slash exists.
    /// For example if `/foo/` is requested but a route only exists for `/foo`, the
    /// client is redirected to `/foo` with HTTP status code 301. Enabled by default.
    pub fn redirect_slashes(&mut self, enabled: bool) -> &mut Self {
        self.redirect_slashes = enabled;
        self
    }

    /// Configurable handler which is called when no matching route is
    /// found. The response status is preset to `404 Not Found`.
    pub fn not_found(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.not_found = Box::new(handler);
        self
    }

    /// A handler called after every request, whatever its outcome. It is not
    /// part of any chain and runs even if the chain stopped early.
    /// See [`defaults::logger`](crate::defaults::logger).
    pub fn logger(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.logger = Some(Box::new(handler));
        self
    }

    /// Looks up the handler chain registered for a method and path.
    ///
    /// Returns `None` if the path is unknown. If the path is known but nothing
    /// was registered for the method, the match carries no value. The same
    /// holds for a bare prefix shared by several routes, such as `/us` for
    /// `/users` and `/usable`; its match has no `options` either.
    /// ```rust
    /// use fitrouter::{Context, Router};
    /// use hyper::Method;
    ///
    /// # fn main() -> Result<(), fitrouter::InsertError> {
    /// let mut router = Router::default();
    /// router.get("/home", vec![|_: &mut Context<'_>| {}])?;
    ///
    /// let found = router.dispatch(&Method::GET, "/home").unwrap();
    /// assert!(found.value.is_some());
    /// assert!(found.params.is_empty());
    ///
    /// assert!(router.dispatch(&Method::POST, "/home").unwrap().value.is_none());
    /// assert!(router.dispatch(&Method::GET, "/away").is_none());
    /// # Ok(())
    /// # }
    /// ```
    pub fn dispatch(&self, method: &Method, path: &str) -> Option<Match<'_, Chain>> {
        self.tree.at(method, path)
    }

    /// Resolves a request to a handler chain, a trailing slash redirect or nothing.
    pub fn resolve(&self, method: &Method, path: &str) -> Route<'_> {
        if let Some(Match {
            value: Some(handlers),
            params,
            ..
        }) = self.dispatch(method, path)
        {
            if !handlers.is_empty() {
                return Route::Found { handlers, params };
            }
        }

        if self.redirect_slashes {
            if let Some(location) = self.redirect_path(method, path) {
                return Route::Redirect(location);
            }
        }

        Route::NotFound
    }

    // The path with its trailing slash toggled, if that one leads to a handler chain.
    fn redirect_path(&self, method: &Method, path: &str) -> Option<String> {
        let fixed = toggle_trailing_slash(path)?;
        let found = self
            .dispatch(method, &fixed)?
            .value
            .map_or(false, |handlers| !handlers.is_empty());

        if found {
            Some(fixed)
        } else {
            None
        }
    }
}

/// The default router configuration: slash redirects enabled, a JSON 404
/// handler and no logger.
impl Default for Router {
    fn default() -> Self {
        Self {
            tree: Node::default(),
            before: Vec::new(),
            after: Vec::new(),
            not_found: Box::new(defaults::not_found),
            logger: None,
            redirect_slashes: true,
        }
    }
}

/// Prints the routing tree, one node per line.
impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree, f)
    }
}

/// Represents a HTTP handler.
/// This trait is implemented for functions and closures that take a mutable
/// [`Context`] and return nothing; responses are written through the context.
/// ```rust
/// # use fitrouter::{Context, Handler};
/// # use hyper::StatusCode;
/// fn hello(c: &mut Context<'_>) {
///     let _ = c.text(StatusCode::OK, "Hello, World!");
/// }
///
/// let handler: Box<dyn Handler> = Box::new(hello);
/// ```
///
/// Chains mixing several closures can be built from boxed closures:
/// ```rust
/// # use fitrouter::{BoxHandler, Context, Router};
/// # fn main() -> Result<(), fitrouter::InsertError> {
/// let greeting = String::from("hi");
/// let chain: Vec<BoxHandler> = vec![
///     Box::new(|c: &mut Context<'_>| { c.next(); }),
///     Box::new(move |c: &mut Context<'_>| { let _ = c.text(hyper::StatusCode::OK, greeting.clone()); }),
/// ];
///
/// let mut router = Router::default();
/// router.get("/", chain)?;
/// # Ok(())
/// # }
/// ```
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>);
}

impl<F> Handler for F
where
    F: Fn(&mut Context<'_>) + Send + Sync,
{
    fn handle(&self, ctx: &mut Context<'_>) {
        self(ctx)
    }
}

/// A boxed handler closure, for building chains out of different closures.
pub type BoxHandler = Box<dyn Fn(&mut Context<'_>) + Send + Sync>;

#[doc(hidden)]
pub struct MakeRouterService(RouterService);

impl<T> Service<T> for MakeRouterService {
    type Response = RouterService;
    type Error = hyper::Error;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        let service = self.0.clone();
        future::ok(service)
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct RouterService(Arc<Router>);

impl RouterService {
    fn new(router: Router) -> Self {
        RouterService(Arc::new(router))
    }
}

impl Service<Request<Body>> for RouterService {
    type Response = Response<Body>;
    type Error = hyper::Error;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        future::ok(self.0.serve(req))
    }
}

impl Router {
    /// Converts the `Router` into a `Service` which you can serve directly with `Hyper`.
    /// No routes can be added afterwards.
    /// If you have an existing `Service` that you want to incorporate a `Router` into, see
    /// [`Router::serve`](crate::Router::serve).
    /// ```rust,no_run
    /// # use fitrouter::Router;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// // Our router...
    /// let router = Router::default();
    ///
    /// // Convert it into a service...
    /// let service = router.into_service();
    ///
    /// // Serve with hyper
    /// hyper::Server::bind(&([127, 0, 0, 1], 3030).into())
    ///     .serve(service)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_service(self) -> MakeRouterService {
        MakeRouterService(RouterService::new(self))
    }

    /// Runs a request through the router and returns its response. You will
    /// generally not need to use this function directly, and instead use
    /// [`Router::into_service`](crate::Router::into_service). However, it may be useful when
    /// incorporating the router into a larger service.
    /// ```rust,no_run
    /// # use fitrouter::Router;
    /// # use hyper::service::{make_service_fn, service_fn};
    /// # use hyper::{Request, Body, Server};
    /// # use std::convert::Infallible;
    /// # use std::sync::Arc;
    ///
    /// # async fn run() {
    /// let router = Arc::new(Router::default());
    ///
    /// let make_svc = make_service_fn(move |_| {
    ///     let router = router.clone();
    ///     async move {
    ///         Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
    ///             let router = router.clone();
    ///             async move { Ok::<_, Infallible>(router.serve(req)) }
    ///         }))
    ///     }
    /// });
    ///
    /// let server = Server::bind(&([127, 0, 0, 1], 3000).into())
    ///     .serve(make_svc)
    ///     .await;
    /// # }
    /// ```
    pub fn serve(&self, req: Request<Body>) -> Response<Body> {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let mut ctx = match self.resolve(&method, &path) {
            Route::Found { handlers, params } => {
                let chain = self
                    .before
                    .iter()
                    .chain(handlers)
                    .chain(&self.after)
                    .map(|h| &**h as &dyn Handler)
                    .collect();

                let mut ctx = Context::new(req, chain, params);
                ctx.next();
                ctx
            }
            Route::Redirect(location) => {
                tracing::debug!(%method, from = %path, to = %location, "redirecting trailing slash");

                let mut ctx = Context::new(req, Vec::new(), Params::default());
                if let Err(err) = ctx.redirect(StatusCode::MOVED_PERMANENTLY, &location) {
                    tracing::warn!(error = %err, "failed to write redirect");
                }
                ctx
            }
            Route::NotFound => {
                tracing::debug!(%method, %path, "no route matched");

                let mut ctx = Context::new(req, vec![&*self.not_found], Params::default());
                ctx.set_status(StatusCode::NOT_FOUND);
                ctx.next();
                ctx
            }
        };

        if let Some(logger) = &self.logger {
            logger.handle(&mut ctx);
        }

        ctx.into_response()
    }
}
