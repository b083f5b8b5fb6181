use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;
use itertools::Itertools;

pub const KEY_SEP: char = '/';

/// Location of a value inside nested containers, written `a/b/0`.
/// Positions inside sequences are decimal segments.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", from = "String"))]
pub struct KeyChain {
    keys: Vec<String>
}

impl KeyChain {
    pub fn root() -> Self {
        Self { keys: vec![] }
    }

    pub fn parse(s: &str) -> Self {
        s.split(KEY_SEP)
            .filter(|k| !k.is_empty())
            .collect()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_root(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn push<K>(&mut self, key: K)
    where K: Into<String> {
        self.keys.push(key.into())
    }

    pub fn pop(&mut self) -> Option<String> {
        self.keys.pop()
    }

    pub fn join<K>(&self, key: K) -> Self
    where K: Into<String> {
        let mut child = self.clone();
        child.push(key);
        child
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            let keys = self.keys[.. self.len() - 1].to_vec();
            Some(Self { keys })
        }
    }

    pub fn last(&self) -> Option<&str> {
        self.keys.last().map(|k| k.as_str())
    }

    /// True if `prefix` is this chain or one of its ancestors.
    pub fn starts_with(&self, prefix: &KeyChain) -> bool {
        self.keys.starts_with(&prefix.keys)
    }

    pub fn strip_prefix(&self, prefix: &KeyChain) -> Option<Self> {
        self.keys.strip_prefix(prefix.keys.as_slice()).map(|rest|
            Self { keys: rest.to_vec() }
        )
    }

    pub fn concat(&self, other: &KeyChain) -> Self {
        let keys = self.keys.iter().chain(other.keys.iter()).cloned().collect();
        Self { keys }
    }
}

impl Display for KeyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keys.iter().join(&KEY_SEP.to_string()))
    }
}

impl FromStr for KeyChain {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for KeyChain {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for KeyChain {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<KeyChain> for String {
    fn from(chain: KeyChain) -> Self {
        chain.to_string()
    }
}

impl<K> FromIterator<K> for KeyChain
where K: Into<String> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let keys = iter.into_iter().map(|k| k.into()).collect();
        Self { keys }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let c = KeyChain::parse("a/b/0");
        assert_eq!(c.keys(), &["a", "b", "0"]);
        assert_eq!(c.len(), 3);
        assert_eq!(c.to_string(), "a/b/0");
    }

    #[test]
    fn parse_root() {
        assert!(KeyChain::parse("").is_root());
        assert!(KeyChain::parse("/").is_root());
        assert_eq!(KeyChain::root().to_string(), "");
    }

    #[test]
    fn parse_ignores_empty_segments() {
        let c = KeyChain::parse("/a//b/");
        assert_eq!(c, KeyChain::from_iter(["a", "b"]));
    }

    #[test]
    fn join_and_parent() {
        let c = KeyChain::root().join("a").join("b");
        assert_eq!(c.to_string(), "a/b");
        assert_eq!(c.last(), Some("b"));
        assert_eq!(c.parent(), Some(KeyChain::parse("a")));
        assert_eq!(KeyChain::root().parent(), None);
    }

    #[test]
    fn starts_with() {
        let c = KeyChain::parse("a/b/c");
        assert!(c.starts_with(&KeyChain::parse("a")));
        assert!(c.starts_with(&KeyChain::parse("a/b/c")));
        assert!(c.starts_with(&KeyChain::root()));
        assert!(!c.starts_with(&KeyChain::parse("a/c")));
        assert!(!KeyChain::parse("ab").starts_with(&KeyChain::parse("a")));
    }

    #[test]
    fn strip_and_concat() {
        let c = KeyChain::parse("a/b/c");
        let rest = c.strip_prefix(&KeyChain::parse("a")).unwrap();
        assert_eq!(rest, KeyChain::parse("b/c"));
        assert_eq!(KeyChain::parse("x").concat(&rest), KeyChain::parse("x/b/c"));
        assert_eq!(c.strip_prefix(&KeyChain::parse("b")), None);
    }
}
