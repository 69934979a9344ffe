use thiserror::Error;

/// Represents errors that can occur when registering a route.
///
/// These are configuration errors: a router that produced one should not go
/// on to serve requests.
#[derive(Debug, Error)]
pub enum InsertError {
    #[error("route path must not be empty")]
    EmptyPath,
    #[error("expect path beginning with '/', found: '{0}'")]
    MissingLeadingSlash(String),
    #[error("a '{method}' handler is already registered for path '{path}'")]
    DuplicateRoute { method: String, path: String },
    #[error("'{path}' mixes a static segment with a parameter or catch-all at the same position")]
    MixedSegmentKinds { path: String },
    #[error("'{path}' names parameter ':{requested}' where ':{existing}' is already registered")]
    ParamNameConflict {
        path: String,
        existing: String,
        requested: String,
    },
    #[error("catch-all parameters are only allowed at the end of a path, in '{path}'")]
    CatchAllNotLast { path: String },
    #[error("parameter names must be non-empty and free of ':' and '*', in '{path}'")]
    InvalidParamName { path: String },
    #[error("constraints for '{path}' must be given as name/pattern pairs")]
    UnevenConstraints { path: String },
    #[error("invalid constraint pattern for parameter '{name}'")]
    InvalidConstraint {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while writing the response for a request.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("the response for this request has already been written")]
    AlreadyFinalized,
    #[error("invalid response header")]
    InvalidHeader(#[from] hyper::http::Error),
}
