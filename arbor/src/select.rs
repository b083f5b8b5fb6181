use ahash::AHashMap;
use itertools::Itertools;
use crate::KeyChain;

/// Key chains a selector refers to. A listed chain matches itself and every
/// chain below it.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyChains {
    List(Vec<KeyChain>),
    Rename(AHashMap<KeyChain, KeyChain>)
}

impl KeyChains {
    fn matching(&self, chain: &KeyChain) -> Option<&KeyChain> {
        self.iter()
            .filter(|c| chain.starts_with(c))
            .max_by_key(|c| c.len())
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &KeyChain> + '_> {
        match self {
            KeyChains::List(list) => Box::new(list.iter()),
            KeyChains::Rename(map) => Box::new(map.keys())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub apply: bool,
    pub rename_to: Option<KeyChain>
}

/// Decides, per key chain, whether an operation runs there.
#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    key_chains: Option<KeyChains>,
    to_apply: bool,
    prune_unapplied: bool
}

impl Selector {
    pub fn all() -> Self {
        Self { key_chains: None, to_apply: true, prune_unapplied: false }
    }

    pub fn only<I, K>(chains: I) -> Self
    where I: IntoIterator<Item = K>, K: Into<KeyChain> {
        let list = chains.into_iter().map(|c| c.into()).collect_vec();
        Self { key_chains: Some(KeyChains::List(list)), ..Self::all() }
    }

    pub fn except<I, K>(chains: I) -> Self
    where I: IntoIterator<Item = K>, K: Into<KeyChain> {
        Self::only(chains).to_apply(false)
    }

    pub fn rename<I, K1, K2>(pairs: I) -> Self
    where I: IntoIterator<Item = (K1, K2)>, K1: Into<KeyChain>, K2: Into<KeyChain> {
        let map = pairs.into_iter().map(|(a, b)| (a.into(), b.into())).collect();
        Self { key_chains: Some(KeyChains::Rename(map)), ..Self::all() }
    }

    pub fn to_apply(mut self, to_apply: bool) -> Self {
        self.to_apply = to_apply;
        self
    }

    pub fn prune_unapplied(mut self, prune: bool) -> Self {
        self.prune_unapplied = prune;
        self
    }

    pub fn key_chains(&self) -> Option<&KeyChains> {
        self.key_chains.as_ref()
    }

    pub fn is_to_apply(&self) -> bool {
        self.to_apply
    }

    pub fn prunes_unapplied(&self) -> bool {
        self.prune_unapplied
    }

    pub fn resolve(&self, chain: &KeyChain) -> Resolution {
        let Some(key_chains) = &self.key_chains else {
            return Resolution { apply: true, rename_to: None }
        };

        let matched = key_chains.matching(chain);
        let apply = matched.is_some() == self.to_apply;

        let rename_to = match (key_chains, matched) {
            (KeyChains::Rename(map), Some(from)) if apply => {
                let rest = chain.strip_prefix(from).unwrap_or_default();
                map.get(from).map(|to| to.concat(&rest))
            },
            _ => None
        };

        Resolution { apply, rename_to }
    }

    /// True if the operation may run at `chain` or anywhere below it.
    pub fn covers(&self, chain: &KeyChain) -> bool {
        let Some(key_chains) = &self.key_chains else {
            return true
        };

        if self.to_apply {
            key_chains.iter().any(|c| chain.starts_with(c) || c.starts_with(chain))
        } else {
            !key_chains.iter().any(|c| chain.starts_with(c))
        }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kc(s: &str) -> KeyChain {
        KeyChain::parse(s)
    }

    #[test]
    fn all() {
        let s = Selector::all();
        assert!(s.resolve(&kc("a/b")).apply);
        assert!(s.covers(&kc("a")));
        assert_eq!(s.resolve(&kc("a/b")).rename_to, None);
    }

    #[test]
    fn only() {
        let s = Selector::only(["a/b", "c"]);
        assert!(s.resolve(&kc("a/b")).apply);
        assert!(s.resolve(&kc("c/d/e")).apply);
        assert!(!s.resolve(&kc("a/c")).apply);
        assert!(!s.resolve(&kc("a")).apply);
    }

    #[test]
    fn except() {
        let s = Selector::except(["a/b"]);
        assert!(!s.resolve(&kc("a/b")).apply);
        assert!(!s.resolve(&kc("a/b/c")).apply);
        assert!(s.resolve(&kc("a/c")).apply);
        assert!(!s.is_to_apply());
    }

    #[test]
    fn covers() {
        let s = Selector::only(["a/b"]);
        assert!(s.covers(&kc("a")));
        assert!(s.covers(&kc("a/b/c")));
        assert!(!s.covers(&kc("c")));

        let s = Selector::except(["a"]);
        assert!(!s.covers(&kc("a/b")));
        assert!(s.covers(&kc("b")));
    }

    #[test]
    fn rename() {
        let s = Selector::rename([("a/b", "x"), ("c", "y/z")]);
        let r = s.resolve(&kc("a/b"));
        assert!(r.apply);
        assert_eq!(r.rename_to, Some(kc("x")));

        let r = s.resolve(&kc("c/d"));
        assert_eq!(r.rename_to, Some(kc("y/z/d")));

        let r = s.resolve(&kc("e"));
        assert!(!r.apply);
        assert_eq!(r.rename_to, None);
    }

    #[test]
    fn rename_excluded() {
        let s = Selector::rename([("a", "x")]).to_apply(false);
        let r = s.resolve(&kc("a"));
        assert!(!r.apply);
        assert_eq!(r.rename_to, None);
        assert!(s.resolve(&kc("b")).apply);
    }

    #[test]
    fn longest_match_wins() {
        let s = Selector::rename([("a", "x"), ("a/b", "y")]);
        assert_eq!(s.resolve(&kc("a/b/c")).rename_to, Some(kc("y/c")));
        assert_eq!(s.resolve(&kc("a/d")).rename_to, Some(kc("x/d")));
    }

    #[test]
    fn prune_flag() {
        let s = Selector::except(["a"]).prune_unapplied(true);
        assert!(s.prunes_unapplied());
    }
}
