//! Per-route metadata: the route's name, the path it was registered with and
//! the validation patterns attached to its parameters.
use crate::error::InsertError;
use crate::params::Params;

use regex::Regex;

/// Options attached to a registered route.
///
/// Returned by every registration method on [`Router`](crate::Router), so
/// that a name and parameter constraints can be added after the fact:
///
/// ```rust
/// # use fitrouter::{Router, Context};
/// # fn main() -> Result<(), fitrouter::InsertError> {
/// let mut router = Router::default();
/// router
///     .get("/users/:id", vec![|_: &mut Context<'_>| {}])?
///     .name("user")
///     .constrain(&["id", "[0-9]+"])?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    name: Option<String>,
    path: String,
    params: Vec<String>,
    constraints: Vec<(String, Regex)>,
}

impl RouteOptions {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            name: None,
            path: path.to_owned(),
            params: param_names(path),
            constraints: Vec::new(),
        }
    }

    /// Sets the name of the route.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Adds validation patterns to the route's parameters, given as
    /// alternating parameter names and regular expressions.
    ///
    /// A pattern must match the whole captured value. Pairs with an empty
    /// name or pattern, or naming a parameter that does not occur in the
    /// path, are ignored. An odd number of arguments or a pattern that does
    /// not compile is an error.
    pub fn constrain(&mut self, constraints: &[&str]) -> Result<&mut Self, InsertError> {
        if constraints.len() % 2 != 0 {
            return Err(InsertError::UnevenConstraints {
                path: self.path.clone(),
            });
        }

        for pair in constraints.chunks(2) {
            let (name, pattern) = (pair[0], pair[1]);

            if name.is_empty() || pattern.is_empty() {
                tracing::warn!(path = %self.path, "empty constraint was supplied, ignoring");
                continue;
            }

            if !self.params.iter().any(|param| param == name) {
                tracing::warn!(
                    path = %self.path,
                    param = name,
                    "constraint names a parameter that is not in the path, ignoring"
                );
                continue;
            }

            let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
                InsertError::InvalidConstraint {
                    name: name.to_owned(),
                    source,
                }
            })?;

            match self.constraints.iter_mut().find(|(n, _)| n == name) {
                Some(existing) => existing.1 = regex,
                None => self.constraints.push((name.to_owned(), regex)),
            }
        }

        Ok(self)
    }

    /// Returns the name of the route, if one was set.
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the path the route was registered with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the names of the constrained parameters.
    pub fn constrained(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().map(|(name, _)| name.as_str())
    }

    /// Checks every constrained parameter present in `params` against its pattern.
    pub(crate) fn validate(&self, params: &Params) -> bool {
        self.constraints.iter().all(|(name, regex)| match params.get(name) {
            Some(value) => regex.is_match(value),
            None => true,
        })
    }
}

fn param_names(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;

    while let Some(i) = rest.find(|c| c == ':' || c == '*') {
        let catch_all = rest.as_bytes()[i] == b'*';
        let tail = &rest[i + 1..];
        let end = if catch_all {
            tail.len()
        } else {
            tail.find('/').unwrap_or(tail.len())
        };

        if end > 0 {
            names.push(tail[..end].to_owned());
        }
        rest = &tail[end..];
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_param_names() {
        let options = RouteOptions::new("/find/:this/:withid/*rest");
        assert_eq!(options.params, ["this", "withid", "rest"]);

        let options = RouteOptions::new("/user_:name/files/*path");
        assert_eq!(options.params, ["name", "path"]);
    }

    #[test]
    fn drops_unusable_constraints() {
        let mut options = RouteOptions::new("/regex/:id");
        options
            .constrain(&["id", "[0-9]*", "", "x", "name", "", "missing", "[a-z]+"])
            .unwrap();

        assert_eq!(options.constrained().collect::<Vec<_>>(), ["id"]);
    }

    #[test]
    fn uneven_constraints() {
        let mut options = RouteOptions::new("/regex/:id");
        assert!(matches!(
            options.constrain(&["id"]),
            Err(InsertError::UnevenConstraints { .. })
        ));
    }

    #[test]
    fn invalid_pattern() {
        let mut options = RouteOptions::new("/regex/:id");
        assert!(matches!(
            options.constrain(&["id", "[0-9"]),
            Err(InsertError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn patterns_match_whole_value() {
        let mut options = RouteOptions::new("/regex/:id");
        options.constrain(&["id", "[0-9]+"]).unwrap();

        assert!(options.validate(&Params::from(vec![("id", "23464")])));
        assert!(!options.validate(&Params::from(vec![("id", "d23fds23")])));
        assert!(!options.validate(&Params::from(vec![("id", "23fds")])));
    }

    #[test]
    fn explicit_anchors_are_accepted() {
        let mut options = RouteOptions::new("/regex/:id");
        options.constrain(&["id", "^[0-9]*$"]).unwrap();

        assert!(options.validate(&Params::from(vec![("id", "23464")])));
        assert!(!options.validate(&Params::from(vec![("id", "d23fds23")])));
    }

    #[test]
    fn name() {
        let mut options = RouteOptions::new("/photos");
        assert_eq!(options.get_name(), None);
        options.name("photos");
        assert_eq!(options.get_name(), Some("photos"));
        assert_eq!(options.path(), "/photos");
    }
}
