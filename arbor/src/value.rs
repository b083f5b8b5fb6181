use std::fmt::Display;
use itertools::Itertools;
use crate::{Container, KeyChain};

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value<T> {
    Leaf(T),
    Seq(Vec<Value<T>>),
    Map(Container<T>)
}

impl<T> Value<T> {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Value::Leaf(_))
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, Value::Seq(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn as_leaf(&self) -> Option<&T> {
        match self {
            Value::Leaf(x) => Some(x),
            _ => None
        }
    }

    pub fn as_seq(&self) -> Option<&[Value<T>]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None
        }
    }

    pub fn as_map(&self) -> Option<&Container<T>> {
        match self {
            Value::Map(c) => Some(c),
            _ => None
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Container<T>> {
        match self {
            Value::Map(c) => Some(c),
            _ => None
        }
    }

    pub fn into_leaf(self) -> Option<T> {
        match self {
            Value::Leaf(x) => Some(x),
            _ => None
        }
    }

    pub fn into_map(self) -> Option<Container<T>> {
        match self {
            Value::Map(c) => Some(c),
            _ => None
        }
    }

    pub fn view(&self) -> ValueRef<'_, T> {
        ValueRef::from(self)
    }

    /// Child under one key: a container entry, or a sequence position.
    pub fn child(&self, key: &str) -> Option<&Value<T>> {
        match self {
            Value::Leaf(_) => None,
            Value::Seq(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Map(c) => c.get(key)
        }
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut Value<T>> {
        match self {
            Value::Leaf(_) => None,
            Value::Seq(items) => key.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
            Value::Map(c) => c.get_mut(key)
        }
    }

    /// Removes a container entry, or a sequence position shifting the later
    /// positions down.
    pub fn remove_child(&mut self, key: &str) -> Option<Value<T>> {
        match self {
            Value::Leaf(_) => None,
            Value::Seq(items) => match key.parse::<usize>() {
                Ok(i) if i < items.len() => Some(items.remove(i)),
                _ => None
            },
            Value::Map(c) => c.remove(key)
        }
    }

    pub fn at(&self, chain: &KeyChain) -> Option<&Value<T>> {
        chain.keys().iter().try_fold(self, |v, k| v.child(k))
    }

    pub fn at_mut(&mut self, chain: &KeyChain) -> Option<&mut Value<T>> {
        chain.keys().iter().try_fold(self, |v, k| v.child_mut(k))
    }

    /// Depth-first list of leaves with their key chains, in insertion order.
    pub fn leaves(&self) -> Vec<(KeyChain, &T)> {
        let mut res = vec![];
        self.collect_leaves(KeyChain::root(), &mut res);
        res
    }

    fn collect_leaves<'a>(&'a self, chain: KeyChain, res: &mut Vec<(KeyChain, &'a T)>) {
        match self {
            Value::Leaf(x) => res.push((chain, x)),
            Value::Seq(items) => for (i, v) in items.iter().enumerate() {
                v.collect_leaves(chain.join(i.to_string()), res)
            },
            Value::Map(c) => for (k, v) in c.iter() {
                v.collect_leaves(chain.join(k.as_str()), res)
            }
        }
    }

    pub fn into_leaves(self) -> Vec<(KeyChain, T)> {
        let mut res = vec![];
        self.collect_into_leaves(KeyChain::root(), &mut res);
        res
    }

    fn collect_into_leaves(self, chain: KeyChain, res: &mut Vec<(KeyChain, T)>) {
        match self {
            Value::Leaf(x) => res.push((chain, x)),
            Value::Seq(items) => for (i, v) in items.into_iter().enumerate() {
                v.collect_into_leaves(chain.join(i.to_string()), res)
            },
            Value::Map(c) => for (k, v) in c.into_iter() {
                let child = chain.join(k);
                v.collect_into_leaves(child, res)
            }
        }
    }

    pub fn map_leaves<U, F>(&self, mut f: F) -> Value<U>
    where F: FnMut(&T) -> U {
        self.map_leaves_with(&mut f)
    }

    fn map_leaves_with<U, F>(&self, f: &mut F) -> Value<U>
    where F: FnMut(&T) -> U {
        match self {
            Value::Leaf(x) => Value::Leaf(f(x)),
            Value::Seq(items) => Value::Seq(
                items.iter().map(|v| v.map_leaves_with(f)).collect()
            ),
            Value::Map(c) => Value::Map(
                c.iter().map(|(k, v)| (k.clone(), v.map_leaves_with(f))).collect()
            )
        }
    }

    pub fn into_map_leaves<U, F>(self, mut f: F) -> Value<U>
    where F: FnMut(T) -> U {
        self.into_map_leaves_with(&mut f)
    }

    fn into_map_leaves_with<U, F>(self, f: &mut F) -> Value<U>
    where F: FnMut(T) -> U {
        match self {
            Value::Leaf(x) => Value::Leaf(f(x)),
            Value::Seq(items) => Value::Seq(
                items.into_iter().map(|v| v.into_map_leaves_with(f)).collect()
            ),
            Value::Map(c) => Value::Map(
                c.into_iter().map(|(k, v)| (k, v.into_map_leaves_with(f))).collect()
            )
        }
    }

    pub fn try_map_leaves<U, E, F>(&self, mut f: F) -> Result<Value<U>, E>
    where F: FnMut(&KeyChain, &T) -> Result<U, E> {
        let mut chain = KeyChain::root();
        self.try_map_leaves_with(&mut chain, &mut f)
    }

    fn try_map_leaves_with<U, E, F>(&self, chain: &mut KeyChain, f: &mut F) -> Result<Value<U>, E>
    where F: FnMut(&KeyChain, &T) -> Result<U, E> {
        let res = match self {
            Value::Leaf(x) => Value::Leaf(f(chain, x)?),
            Value::Seq(items) => {
                let mut mapped = Vec::with_capacity(items.len());
                for (i, v) in items.iter().enumerate() {
                    chain.push(i.to_string());
                    let r = v.try_map_leaves_with(chain, f);
                    chain.pop();
                    mapped.push(r?);
                }
                Value::Seq(mapped)
            },
            Value::Map(c) => {
                let mut mapped = Container::new();
                for (k, v) in c.iter() {
                    chain.push(k.as_str());
                    let r = v.try_map_leaves_with(chain, f);
                    chain.pop();
                    mapped.insert(k.as_str(), r?);
                }
                Value::Map(mapped)
            }
        };
        Ok(res)
    }
}

impl<T> From<Container<T>> for Value<T> {
    fn from(c: Container<T>) -> Self {
        Value::Map(c)
    }
}

impl<T> From<Vec<Value<T>>> for Value<T> {
    fn from(items: Vec<Value<T>>) -> Self {
        Value::Seq(items)
    }
}

impl<T> Display for Value<T>
where T: Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Leaf(x) => x.fmt(f),
            Value::Seq(items) => write!(f, "[{}]", items.iter().join(", ")),
            Value::Map(c) => c.fmt(f)
        }
    }
}

/// Borrowed view of an argument: a leaf, a sequence or a container.
#[derive(Debug)]
pub enum ValueRef<'a, T> {
    Leaf(&'a T),
    Seq(&'a [Value<T>]),
    Map(&'a Container<T>)
}

impl<'a, T> Clone for ValueRef<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for ValueRef<'a, T> {}

impl<'a, T> ValueRef<'a, T> {
    pub fn leaf(x: &'a T) -> Self {
        ValueRef::Leaf(x)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ValueRef::Map(_))
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, ValueRef::Seq(_))
    }

    pub fn to_value(&self) -> Value<T>
    where T: Clone {
        match *self {
            ValueRef::Leaf(x) => Value::Leaf(x.clone()),
            ValueRef::Seq(items) => Value::Seq(items.to_vec()),
            ValueRef::Map(c) => Value::Map(c.clone())
        }
    }
}

impl<'a, T> From<&'a Value<T>> for ValueRef<'a, T> {
    fn from(v: &'a Value<T>) -> Self {
        match v {
            Value::Leaf(x) => ValueRef::Leaf(x),
            Value::Seq(items) => ValueRef::Seq(items),
            Value::Map(c) => ValueRef::Map(c)
        }
    }
}

impl<'a, T> From<&'a Container<T>> for ValueRef<'a, T> {
    fn from(c: &'a Container<T>) -> Self {
        ValueRef::Map(c)
    }
}
