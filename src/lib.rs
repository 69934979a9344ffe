//! # FitRouter
//!
//! FitRouter is a lightweight request router with middleware chains.
//!
//! A request is matched against the registered routes by its method and path.
//! The route's handlers then run one after another, each deciding whether to
//! hand the request on by calling [`Context::next`]. Routes are kept in a
//! compressing dynamic trie (radix tree), so matching a path costs a single
//! pass over it, whatever the number of routes.
//!
//! ## Features
//!
//! **Only explicit matches:** A request can only match exactly one or no route.
//! Registrations that would make matching depend on the order of routes, like a
//! static segment and a parameter at the same position, are rejected up front.
//!
//! **Trailing slash redirects:** If `/foo/` is requested and only `/foo` exists
//! (or the other way around), the client is redirected with `301 Moved Permanently`.
//!
//! **Parameters in your routing pattern:** Give a path segment a name and the
//! router delivers the dynamic value to you. Parameters can be constrained with
//! regular expressions, compiled once when the route is registered.
//!
//! **Handler chains:** Every route runs a chain of handlers sharing one
//! request-scoped store. Global handlers can be added before and after every
//! chain, and a logger can observe every outcome.
//!
//! ## Usage
//!
//! Here is a simple example:
//!
//! ```rust,no_run
//! use fitrouter::{Context, Router};
//! use hyper::StatusCode;
//!
//! fn index(c: &mut Context<'_>) {
//!     let _ = c.text(StatusCode::OK, "Hello, World!");
//! }
//!
//! fn hello(c: &mut Context<'_>) {
//!     let user = c.param("user").unwrap_or_default().to_owned();
//!     let _ = c.text(StatusCode::OK, format!("Hello, {}", user));
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::default();
//!     router.get("/", vec![index])?;
//!     router.get("/hello/:user", vec![hello])?;
//!     router.logger(fitrouter::defaults::logger);
//!
//!     hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
//!         .serve(router.into_service())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Named parameters
//!
//! As you can see, `:user` is a *named parameter*. The values are accessible via
//! [`Context::param`] and [`Context::params`].
//!
//! Named parameters match a single path segment, which may be empty:
//!
//! ```ignore
//! Pattern: /user/:user
//!
//!  /user/gordon              match
//!  /user/you                 match
//!  /user/gordon/profile      no match
//!  /user/                    no match
//! ```
//!
//! Against `/user/:user/profile`, the path `/user//profile` matches with an
//! empty `user`. Constrain the parameter, for instance with `[^/]+`, to reject
//! empty values.
//!
//! ### Catch-All parameters
//!
//! The second type are *catch-all* parameters and have the form `*name`. Like the name
//! suggests, they match everything. Therefore they must always be at the **end** of the pattern:
//!
//! ```ignore
//! Pattern: /src/*filepath
//!
//!  /src/somefile.go          match
//!  /src/subdir/somefile.go   match
//! ```
//!
//! ### Constraints
//!
//! ```rust
//! # use fitrouter::{Context, Router};
//! # fn show(_: &mut Context<'_>) {}
//! # fn main() -> Result<(), fitrouter::InsertError> {
//! let mut router = Router::default();
//! router
//!     .get("/articles/:id", vec![show])?
//!     .name("article")
//!     .constrain(&["id", "[0-9]+"])?;
//!
//! assert!(router.dispatch(&hyper::Method::GET, "/articles/42").is_some());
//! assert!(router.dispatch(&hyper::Method::GET, "/articles/latest").is_none());
//! # Ok(())
//! # }
//! ```
//!
//! ### Not Found Handler
//!
//! Requests which could not be matched are answered by the
//! [`Router::not_found`] handler, a JSON `404` by default:
//!
//! ```rust
//! use fitrouter::{Context, Router};
//! use hyper::StatusCode;
//!
//! let mut router = Router::default();
//! router.not_found(|c: &mut Context<'_>| {
//!     let _ = c.text(StatusCode::NOT_FOUND, "nothing here");
//! });
//! ```

#![forbid(unsafe_code)]

mod context;
mod error;
mod options;
mod params;
pub(crate) mod path;
pub(crate) mod tree;

pub mod defaults;

#[doc(hidden)]
pub mod router;

#[doc(inline)]
pub use router::{BoxHandler, Chain, Handler, Route, Router};

pub use context::{Context, Shared};
pub use error::{InsertError, ResponseError};
pub use options::RouteOptions;
pub use params::{Param, Params};
pub use tree::Match;

// test the code examples in README.md
#[cfg(doctest)]
mod test_readme {
  macro_rules! doc_comment {
    ($x:expr) => {
        #[doc = $x]
        extern {}
    };
  }

  doc_comment!(include_str!("../README.md"));
}
