//! The routing tree.
//!
//! Routes are stored in a compressing prefix tree. Every node owns a run of
//! bytes; a node's children are indexed by the first byte of their run so
//! that descent is a binary search. Parameters (`:name`) and catch-alls
//! (`*name`) are children of their own kind, and a node holding one holds
//! nothing else, which keeps every lookup a single pass with no
//! backtracking.
use crate::error::InsertError;
use crate::options::RouteOptions;
use crate::params::Params;
use crate::path::find;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::mem;

use hyper::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Static,
    Param,
    CatchAll,
}

/// A node in the routing tree, storing a value of type `T` per request method.
#[derive(Debug)]
pub struct Node<T> {
    kind: Kind,
    // for parameters and catch-alls this is the sigil followed by the name
    fragment: Vec<u8>,
    indices: Vec<u8>,
    children: Vec<Node<T>>,
    methods: HashMap<Method, T>,
    options: Option<RouteOptions>,
}

/// The result of a successful walk through the tree.
///
/// `value` is `None` when the path exists but nothing was registered for the
/// requested method.
#[derive(Debug)]
pub struct Match<'n, T> {
    pub value: Option<&'n T>,
    pub params: Params,
    pub options: Option<&'n RouteOptions>,
}

enum Segment<'p> {
    Static(&'p [u8]),
    Param(&'p str),
    CatchAll(&'p str),
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self::new(Kind::Static, Vec::new())
    }
}

impl<T> Node<T> {
    fn new(kind: Kind, fragment: Vec<u8>) -> Self {
        Self {
            kind,
            fragment,
            indices: Vec::new(),
            children: Vec::new(),
            methods: HashMap::new(),
            options: None,
        }
    }

    /// Registers `value` for every method in `methods` at `path`.
    ///
    /// The tree may be left partially extended when an error is returned;
    /// such a tree should be discarded.
    pub fn insert(
        &mut self,
        path: &str,
        methods: &[Method],
        value: T,
    ) -> Result<&mut RouteOptions, InsertError>
    where
        T: Clone,
    {
        if path.is_empty() {
            return Err(InsertError::EmptyPath);
        }

        if !path.starts_with('/') {
            return Err(InsertError::MissingLeadingSlash(path.to_owned()));
        }

        let mut node = self;
        for segment in segments(path)? {
            node = match segment {
                Segment::Static(run) => node.insert_static(path, run)?,
                Segment::Param(name) => node.insert_wild(path, Kind::Param, name)?,
                Segment::CatchAll(name) => node.insert_wild(path, Kind::CatchAll, name)?,
            };
        }

        if let Some(method) = methods.iter().find(|m| node.methods.contains_key(*m)) {
            return Err(InsertError::DuplicateRoute {
                method: method.to_string(),
                path: path.to_owned(),
            });
        }

        for method in methods {
            node.methods.insert(method.clone(), value.clone());
        }

        Ok(node.options.get_or_insert_with(|| RouteOptions::new(path)))
    }

    fn insert_static(&mut self, path: &str, mut run: &[u8]) -> Result<&mut Self, InsertError> {
        let mut node = self;

        while let Some(&first) = run.first() {
            if node.has_wild_child() {
                return Err(InsertError::MixedSegmentKinds {
                    path: path.to_owned(),
                });
            }

            node = match node.indices.binary_search(&first) {
                Ok(i) => {
                    let child = &mut node.children[i];
                    let common = common_prefix(&child.fragment, run);
                    if common < child.fragment.len() {
                        child.split(common);
                    }
                    run = &run[common..];
                    child
                }
                Err(i) => {
                    node.indices.insert(i, first);
                    node.children.insert(i, Node::new(Kind::Static, run.to_vec()));
                    run = &[];
                    &mut node.children[i]
                }
            };
        }

        Ok(node)
    }

    fn insert_wild(&mut self, path: &str, kind: Kind, name: &str) -> Result<&mut Self, InsertError> {
        if self.children.is_empty() {
            let sigil = if kind == Kind::Param { b':' } else { b'*' };
            let mut fragment = Vec::with_capacity(name.len() + 1);
            fragment.push(sigil);
            fragment.extend_from_slice(name.as_bytes());

            self.indices.push(sigil);
            self.children.push(Node::new(kind, fragment));
        }

        let child = &mut self.children[0];
        if child.kind != kind {
            return Err(InsertError::MixedSegmentKinds {
                path: path.to_owned(),
            });
        }

        if child.param_name() != name {
            return Err(InsertError::ParamNameConflict {
                path: path.to_owned(),
                existing: child.param_name().into_owned(),
                requested: name.to_owned(),
            });
        }

        Ok(child)
    }

    // Keeps the first `at` bytes and moves everything else into a new child.
    fn split(&mut self, at: usize) {
        let suffix = Node {
            kind: Kind::Static,
            fragment: self.fragment.split_off(at),
            indices: mem::take(&mut self.indices),
            children: mem::take(&mut self.children),
            methods: mem::take(&mut self.methods),
            options: self.options.take(),
        };

        self.indices = vec![suffix.fragment[0]];
        self.children = vec![suffix];
    }

    fn has_wild_child(&self) -> bool {
        self.children
            .first()
            .map_or(false, |child| child.kind != Kind::Static)
    }

    fn param_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.fragment[1..])
    }

    /// Walks the tree for `path`, capturing parameters on the way.
    ///
    /// Returns `None` if the path does not lead to a node, or if a captured
    /// parameter fails its constraint.
    pub fn at(&self, method: &Method, path: &str) -> Option<Match<'_, T>> {
        let bytes = path.as_bytes();
        let mut params = Params::default();
        let mut node = self;
        let mut i = 0;

        while i < bytes.len() {
            let first = node.children.first()?;

            node = match first.kind {
                Kind::Param => {
                    let end = find(bytes, b'/', i);
                    params.push(&first.param_name(), path.get(i..end)?);
                    i = end;
                    first
                }
                Kind::CatchAll => {
                    params.push(&first.param_name(), path.get(i..)?);
                    i = bytes.len();
                    first
                }
                Kind::Static => {
                    let child = &node.children[node.indices.binary_search(&bytes[i]).ok()?];
                    if !bytes[i..].starts_with(&child.fragment) {
                        return None;
                    }
                    i += child.fragment.len();
                    child
                }
            };
        }

        if let Some(options) = &node.options {
            if !options.validate(&params) {
                return None;
            }
        }

        Some(Match {
            value: node.methods.get(method),
            params,
            options: node.options.as_ref(),
        })
    }

    fn fmt_children(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for child in &self.children {
            write!(
                f,
                "{:indent$}{}",
                "",
                String::from_utf8_lossy(&child.fragment),
                indent = depth * 4
            )?;

            if !child.methods.is_empty() {
                let mut methods: Vec<&str> = child.methods.keys().map(Method::as_str).collect();
                methods.sort_unstable();
                write!(f, " ({})", methods.join("|"))?;
            }

            writeln!(f)?;
            child.fmt_children(f, depth + 1)?;
        }

        Ok(())
    }
}

impl<T> fmt::Display for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_children(f, 0)
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn segments(path: &str) -> Result<Vec<Segment<'_>>, InsertError> {
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let sigil = bytes[i..]
            .iter()
            .position(|&b| b == b':' || b == b'*')
            .map_or(bytes.len(), |p| i + p);

        if sigil > i {
            segments.push(Segment::Static(&bytes[i..sigil]));
        }

        if sigil == bytes.len() {
            break;
        }

        let catch_all = bytes[sigil] == b'*';
        let end = if catch_all {
            bytes.len()
        } else {
            find(bytes, b'/', sigil)
        };

        let name = &path[sigil + 1..end];
        if catch_all && name.contains('/') {
            return Err(InsertError::CatchAllNotLast {
                path: path.to_owned(),
            });
        }

        if name.is_empty() || name.contains(|c| c == ':' || c == '*') {
            return Err(InsertError::InvalidParamName {
                path: path.to_owned(),
            });
        }

        segments.push(if catch_all {
            Segment::CatchAll(name)
        } else {
            Segment::Param(name)
        });
        i = end;
    }

    Ok(segments)
}
