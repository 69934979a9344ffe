use std::ops::Index;

/// A single captured URL parameter, consisting of a key and a value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Param {
    pub key: String,
    pub value: String,
}

/// The parameters captured while matching a request path, in the order they
/// appear in the registered route.
///
/// ```rust
/// # use fitrouter::Params;
/// let params = Params::from(vec![("user", "gordon")]);
/// assert_eq!(params.get("user"), Some("gordon"));
/// assert_eq!(params.get("group"), None);
/// assert_eq!(params[0].key, "user");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params(Vec<Param>);

impl Params {
    /// Returns the value of the first parameter registered under the given name.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        self.0
            .iter()
            .find(|param| param.key == name)
            .map(|param| param.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, key: &str, value: &str) {
        self.0.push(Param {
            key: key.to_owned(),
            value: value.to_owned(),
        });
    }
}

impl Index<usize> for Params {
    type Output = Param;

    fn index(&self, i: usize) -> &Param {
        &self.0[i]
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K, V> From<Vec<(K, V)>> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        Params(
            pairs
                .into_iter()
                .map(|(key, value)| Param {
                    key: key.into(),
                    value: value.into(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        let params = Params::from(vec![("id", "22"), ("name", "John")]);

        assert_eq!(params.get("id"), Some("22"));
        assert_eq!(params.get("name"), Some("John"));
        assert_eq!(params.get("doesnotexist"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn keeps_insertion_order() {
        let mut params = Params::default();
        assert!(params.is_empty());

        params.push("this", "something");
        params.push("withid", "23");

        let keys: Vec<_> = params.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["this", "withid"]);
        assert_eq!(params[1].value, "23");
    }
}
