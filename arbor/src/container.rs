use std::fmt::Display;
use indexmap::IndexMap;
use crate::{KeyChain, Value, ValueRef};

/// Ordered mapping of string keys to leaves, sequences or sub-containers.
///
/// Insertion order is kept and used for display and traversal. Equality
/// compares entries regardless of their order.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Container<T> {
    data: IndexMap<String, Value<T>>
}

impl<T> Container<T> {
    pub fn new() -> Self {
        Self { data: IndexMap::new() }
    }

    pub fn view(&self) -> ValueRef<'_, T> {
        ValueRef::Map(self)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn insert<K>(&mut self, key: K, value: Value<T>) -> Option<Value<T>>
    where K: Into<String> {
        self.data.insert(key.into(), value)
    }

    pub fn insert_leaf<K>(&mut self, key: K, leaf: T) -> Option<Value<T>>
    where K: Into<String> {
        self.insert(key, Value::Leaf(leaf))
    }

    pub fn get(&self, key: &str) -> Option<&Value<T>> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value<T>> {
        self.data.get_mut(key)
    }

    /// Removes the entry and keeps the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value<T>> {
        self.data.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value<T>)> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Value<T>)> {
        self.data.iter_mut()
    }

    pub fn at(&self, chain: &KeyChain) -> Option<&Value<T>> {
        let (first, rest) = chain.keys().split_first()?;
        rest.iter().try_fold(self.get(first)?, |v, k| v.child(k))
    }

    pub fn at_mut(&mut self, chain: &KeyChain) -> Option<&mut Value<T>> {
        let (first, rest) = chain.keys().split_first()?;
        rest.iter().try_fold(self.get_mut(first)?, |v, k| v.child_mut(k))
    }

    /// Sets the value at `chain`, creating intermediate containers. An
    /// intermediate value that is not a container is replaced by one.
    pub fn set_at(&mut self, chain: &KeyChain, value: Value<T>) -> Option<Value<T>> {
        let Some((last, init)) = chain.keys().split_last() else {
            return None
        };

        let mut node = self;
        for k in init {
            let entry = node.data.entry(k.clone()).or_insert_with(|| Value::Map(Container::new()));
            if !entry.is_map() {
                *entry = Value::Map(Container::new());
            }
            let Value::Map(c) = entry else { unreachable!() };
            node = c;
        }
        node.insert(last.as_str(), value)
    }

    /// Removes the value at `chain`. Removing a sequence position shifts
    /// the later positions down.
    pub fn remove_at(&mut self, chain: &KeyChain) -> Option<Value<T>> {
        let parent = chain.parent()?;
        let last = chain.last()?;
        if parent.is_root() {
            self.remove(last)
        } else {
            self.at_mut(&parent)?.remove_child(last)
        }
    }

    pub fn leaves(&self) -> Vec<(KeyChain, &T)> {
        self.iter().flat_map(|(k, v)| {
            let prefix = KeyChain::root().join(k.as_str());
            v.leaves().into_iter().map(move |(c, x)| (prefix.concat(&c), x))
        }).collect()
    }

    pub fn key_chains(&self) -> Vec<KeyChain> {
        self.leaves().into_iter().map(|(c, _)| c).collect()
    }

    pub fn map_leaves<U, F>(&self, mut f: F) -> Container<U>
    where F: FnMut(&T) -> U {
        self.iter().map(|(k, v)| (k.clone(), v.map_leaves(&mut f))).collect()
    }
}

impl<T> Default for Container<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> FromIterator<(K, Value<T>)> for Container<T>
where K: Into<String> {
    fn from_iter<I: IntoIterator<Item = (K, Value<T>)>>(iter: I) -> Self {
        let data = iter.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self { data }
    }
}

impl<T> IntoIterator for Container<T> {
    type Item = (String, Value<T>);
    type IntoIter = indexmap::map::IntoIter<String, Value<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<T> Display for Container<T>
where T: Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl<T> Container<T>
where T: Display {
    fn fmt_indented(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "{{}}")
        }

        let pad = "    ".repeat(depth + 1);
        writeln!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            write!(f, "{pad}{k}: ")?;
            match v {
                Value::Map(c) => c.fmt_indented(f, depth + 1)?,
                _ => write!(f, "{v}")?
            }
            if i + 1 < self.len() {
                writeln!(f, ",")?;
            } else {
                writeln!(f)?;
            }
        }
        write!(f, "{}}}", "    ".repeat(depth))
    }
}

/// Builds a [`Container`] from `key => leaf` pairs; a braced right-hand side
/// is a nested container.
///
/// ```
/// use arbor::cont;
/// let c = cont!{ "a" => 1, "b" => { "c" => 2 } };
/// assert_eq!(c.key_chains().len(), 2);
/// ```
#[macro_export]
macro_rules! cont {
    () => { $crate::Container::new() };
    (@acc $c:ident; ) => {};
    (@acc $c:ident; $key:expr => { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $c.insert($key, $crate::Value::Map($crate::cont!{ $($inner)* }));
        $( $crate::cont!(@acc $c; $($rest)*); )?
    };
    (@acc $c:ident; $key:expr => $val:expr $(, $($rest:tt)*)?) => {
        $c.insert_leaf($key, $val);
        $( $crate::cont!(@acc $c; $($rest)*); )?
    };
    ($($body:tt)+) => {{
        let mut c = $crate::Container::new();
        $crate::cont!(@acc c; $($body)+);
        c
    }};
}
