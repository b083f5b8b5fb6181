use std::marker::PhantomData;
use itertools::Itertools;
use log::{debug, trace};
use crate::{Backend, Container, KeyChain, MapError, Operation, Selector, ShapeMismatch, Value, ValueRef, Writeback};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapConfig {
    /// Recurse into sequences as if they were containers keyed by position.
    pub map_sequences: bool,
    /// Secondary containers must provide every selected key chain of the primary.
    pub assert_identical: bool
}

impl MapConfig {
    pub fn map_sequences(mut self, val: bool) -> Self {
        self.map_sequences = val;
        self
    }

    pub fn assert_identical(mut self, val: bool) -> Self {
        self.assert_identical = val;
        self
    }
}

/// Applies a backend operation leaf-wise across one or more nested arguments.
///
/// The first container among the arguments drives the traversal; other
/// containers are matched against it by key chain, and leaves are broadcast
/// unchanged to every position below them.
pub struct Mapper<B> {
    backend: B,
    selector: Selector,
    config: MapConfig
}

struct Slot<O> {
    value: O,
    applied: bool
}

impl<B> Mapper<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, selector: Selector::all(), config: MapConfig::default() }
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_config(mut self, config: MapConfig) -> Self {
        self.config = config;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Maps `op` over `args`; the result has the structure of the driving
    /// argument.
    ///
    /// # Panics
    ///
    /// Panics if `args` is empty.
    pub fn apply<T>(&self, op: &B::Op, args: &[ValueRef<'_, T>]) -> Result<Value<B::Output>, MapError<B::Error>>
    where
        B: Backend<T>,
        T: Clone + Into<B::Output>
    {
        let res = self.run(op, args)?;
        Ok(res.map(|v| v.into_map_leaves(|s| s.value)).unwrap_or_else(|| Value::Map(Container::new())))
    }

    /// Like [`Mapper::apply`], but writes the applied leaves into `out`,
    /// reusing the storage of leaves already present there. Leaves of `out`
    /// that the operation did not produce keep their values. Nothing is
    /// written unless the whole call succeeds.
    ///
    /// # Panics
    ///
    /// Panics if `args` is empty.
    pub fn apply_into<'o, T>(&self, op: &B::Op, args: &[ValueRef<'_, T>], out: &'o mut Container<B::Output>) -> Result<&'o mut Container<B::Output>, MapError<B::Error>>
    where
        B: Backend<T>,
        B::Output: Writeback,
        T: Clone + Into<B::Output>
    {
        let Some(res) = self.run(op, args)? else {
            return Ok(out)
        };

        let updates = res.into_leaves().into_iter().filter(|(_, s)| s.applied).collect_vec();

        for (chain, slot) in updates.iter() {
            let mismatch = match out.at(chain) {
                _ if chain.is_root() => Some(ShapeMismatch::new("container", "leaf")),
                Some(Value::Leaf(current)) => current.check_shape(&slot.value).err(),
                Some(Value::Seq(_)) => Some(ShapeMismatch::new("sequence", "leaf")),
                Some(Value::Map(_)) => Some(ShapeMismatch::new("container", "leaf")),
                None => blocked_at(out, chain)
            };
            if let Some(mismatch) = mismatch {
                return Err(MapError::OutputShape { op: op.name().to_string(), path: chain.clone(), mismatch })
            }
        }

        debug!("{}: writing {} leaves into output", op.name(), updates.len());

        for (chain, slot) in updates {
            match out.at_mut(&chain) {
                Some(Value::Leaf(current)) => current.write_back(slot.value),
                _ => { out.set_at(&chain, Value::Leaf(slot.value)); }
            }
        }

        Ok(out)
    }

    fn run<T>(&self, op: &B::Op, args: &[ValueRef<'_, T>]) -> Step<B::Output, B::Error>
    where
        B: Backend<T>,
        T: Clone + Into<B::Output>
    {
        assert!(!args.is_empty(), "{}: no arguments given", op.name());

        let driver = args.iter().position(|a| a.is_map())
            .or_else(|| args.iter().position(|a| self.config.map_sequences && a.is_seq()))
            .unwrap_or(0);

        debug!("{}: mapping over {} argument(s), driver = {driver}", op.name(), args.len());

        let mut walk = Walk { mapper: self, op, driver, moves: vec![], _leaf: PhantomData };
        let res = walk.value(&mut KeyChain::root(), args)?;
        let mut moves = walk.moves;

        if moves.is_empty() {
            return Ok(res)
        }

        let rename_err = |(from, to): (KeyChain, KeyChain)|
            MapError::Rename { op: op.name().to_string(), path: from, to };

        let Some(Value::Map(mut c)) = res else {
            return Err(rename_err(moves.swap_remove(0)))
        };

        // latest first, so that positions of earlier sequence entries stay valid
        let mut moved = Vec::with_capacity(moves.len());
        for (from, to) in moves.into_iter().rev() {
            let Some(v) = c.remove_at(&from) else {
                return Err(rename_err((from, to)))
            };
            drop_emptied(&mut c, &from);
            moved.push((to, v));
        }

        for (to, v) in moved.into_iter().rev() {
            trace!("{}: renamed to `{to}`", op.name());
            c.set_at(&to, v);
        }
        Ok(Some(Value::Map(c)))
    }
}

/// Removes the ancestors of a moved-out entry that it leaves empty.
fn drop_emptied<O>(c: &mut Container<O>, chain: &KeyChain) {
    let mut parent = chain.parent();
    while let Some(p) = parent.filter(|p| !p.is_root()) {
        let empty = match c.at(&p) {
            Some(Value::Map(m)) => m.is_empty(),
            Some(Value::Seq(items)) => items.is_empty(),
            _ => false
        };
        if !empty {
            break
        }
        c.remove_at(&p);
        parent = p.parent();
    }
}

/// A missing output slot can be created unless an ancestor of it is not a container.
fn blocked_at<O>(out: &Container<O>, chain: &KeyChain) -> Option<ShapeMismatch> {
    (1 .. chain.len()).find_map(|n| {
        let prefix: KeyChain = chain.keys()[.. n].iter().cloned().collect();
        match out.at(&prefix) {
            Some(Value::Leaf(_)) => Some(ShapeMismatch::new("leaf", "container")),
            Some(Value::Seq(_)) => Some(ShapeMismatch::new("sequence", "container")),
            _ => None
        }
    })
}

type Step<O, E> = Result<Option<Value<Slot<O>>>, MapError<E>>;

struct Walk<'m, 'o, B, T>
where B: Backend<T> {
    mapper: &'m Mapper<B>,
    op: &'o B::Op,
    driver: usize,
    moves: Vec<(KeyChain, KeyChain)>,
    _leaf: PhantomData<fn(&T)>
}

impl<'m, 'o, B, T> Walk<'m, 'o, B, T>
where
    B: Backend<T>,
    T: Clone + Into<B::Output>
{
    fn value<'a>(&mut self, chain: &mut KeyChain, args: &[ValueRef<'a, T>]) -> Step<B::Output, B::Error> {
        match args[self.driver] {
            ValueRef::Map(c) => {
                let mut res = Container::new();
                for (key, v) in c.iter() {
                    chain.push(key.as_str());
                    let r = self.child(chain, key, ValueRef::from(v), args);
                    chain.pop();
                    if let Some(r) = r? {
                        res.insert(key.as_str(), r);
                    }
                }
                if res.is_empty() && !c.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Value::Map(res)))
                }
            },
            ValueRef::Seq(items) if self.mapper.config.map_sequences => {
                let mut res = vec![];
                for (i, v) in items.iter().enumerate() {
                    let key = i.to_string();
                    chain.push(key.as_str());
                    let r = self.child(chain, &key, ValueRef::from(v), args);
                    chain.pop();
                    if let Some(r) = r? {
                        res.push(r);
                    }
                }
                if res.is_empty() && !items.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Value::Seq(res)))
                }
            },
            ValueRef::Seq(_) => Ok(self.unapplied(chain, args[self.driver])),
            ValueRef::Leaf(_) => self.leaf(chain, args)
        }
    }

    fn child<'a>(&mut self, chain: &mut KeyChain, key: &str, value: ValueRef<'a, T>, args: &[ValueRef<'a, T>]) -> Step<B::Output, B::Error> {
        let mut sub = Vec::with_capacity(args.len());
        for (i, &a) in args.iter().enumerate() {
            let v = if i == self.driver {
                Some(value)
            } else {
                self.secondary(key, a)
            };
            match v {
                Some(v) => sub.push(v),
                None => return self.mismatch(chain, i, value)
            }
        }
        self.value(chain, &sub)
    }

    fn secondary<'a>(&self, key: &str, arg: ValueRef<'a, T>) -> Option<ValueRef<'a, T>> {
        match arg {
            ValueRef::Map(c) => c.get(key).map(ValueRef::from),
            ValueRef::Seq(items) if self.mapper.config.map_sequences => {
                key.parse::<usize>().ok().and_then(|i| items.get(i)).map(ValueRef::from)
            },
            leaf => Some(leaf)
        }
    }

    fn leaf(&mut self, chain: &KeyChain, args: &[ValueRef<'_, T>]) -> Step<B::Output, B::Error> {
        let res = self.mapper.selector.resolve(chain);
        if !res.apply {
            return Ok(self.unapplied(chain, args[self.driver]))
        }

        // a container or sequence facing a leaf is never a missing key
        let mut leaves = Vec::with_capacity(args.len());
        for (i, a) in args.iter().enumerate() {
            match a {
                ValueRef::Leaf(x) => leaves.push(*x),
                _ => return Err(MapError::KeyMismatch { op: self.op.name().to_string(), path: chain.clone(), arg: i })
            }
        }

        trace!("{}: applying at `{chain}`", self.op.name());

        let value = self.mapper.backend.call(self.op, &leaves).map_err(|e|
            MapError::Backend { op: self.op.name().to_string(), path: chain.clone(), source: e }
        )?;

        if let Some(to) = res.rename_to {
            if &to != chain {
                self.moves.push((chain.clone(), to));
            }
        }

        Ok(Some(Value::Leaf(Slot { value, applied: true })))
    }

    fn mismatch(&self, chain: &KeyChain, arg: usize, value: ValueRef<'_, T>) -> Step<B::Output, B::Error> {
        if self.mapper.config.assert_identical && self.mapper.selector.covers(chain) {
            Err(MapError::KeyMismatch { op: self.op.name().to_string(), path: chain.clone(), arg })
        } else {
            trace!("{}: argument {arg} has no match at `{chain}`, skipped", self.op.name());
            Ok(self.unapplied(chain, value))
        }
    }

    fn unapplied(&self, chain: &KeyChain, value: ValueRef<'_, T>) -> Option<Value<Slot<B::Output>>> {
        if self.mapper.selector.prunes_unapplied() {
            trace!("{}: pruned `{chain}`", self.op.name());
            None
        } else {
            Some(value.to_value().into_map_leaves(|x| Slot { value: x.into(), applied: false }))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use itertools::Itertools;
    use crate::{cont, FnBackend};
    use super::*;

    #[derive(Debug, PartialEq)]
    struct StubError(String);

    impl fmt::Display for StubError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for StubError {}

    fn stub(op: &str, args: &[&i64]) -> Result<i64, StubError> {
        match op {
            "id" => Ok(*args[0]),
            "neg" => Ok(-args[0]),
            "add" => Ok(args.iter().copied().sum()),
            "mul" => Ok(args.iter().copied().product()),
            "fail_neg" if *args[0] < 0 => Err(StubError(format!("negative: {}", args[0]))),
            "fail_neg" => Ok(*args[0]),
            _ => Err(StubError(format!("unknown op: {op}")))
        }
    }

    type Stub = FnBackend<fn(&str, &[&i64]) -> Result<i64, StubError>>;

    fn mapper() -> Mapper<Stub> {
        Mapper::new(FnBackend::new(stub as fn(&str, &[&i64]) -> Result<i64, StubError>))
    }

    fn sample() -> Container<i64> {
        cont!{
            "a" => 1,
            "b" => { "c" => 2, "d" => 3 },
            "e" => { "f" => { "g" => 4 } }
        }
    }

    fn map_of(v: Value<i64>) -> Container<i64> {
        v.into_map().unwrap()
    }

    #[test]
    fn identity_keeps_structure() {
        let c = sample();
        let res = map_of(mapper().apply("id", &[c.view()]).unwrap());
        assert_eq!(res, c);
        assert_eq!(res.key_chains(), c.key_chains());
        assert_eq!(res.keys().collect_vec(), vec!["a", "b", "e"]);
    }

    #[test]
    fn unary() {
        let c = sample();
        let res = map_of(mapper().apply("neg", &[c.view()]).unwrap());
        assert_eq!(res, cont!{
            "a" => -1,
            "b" => { "c" => -2, "d" => -3 },
            "e" => { "f" => { "g" => -4 } }
        });
    }

    #[test]
    fn binary_lockstep() {
        let c1 = cont!{ "a" => 1, "b" => { "c" => 2 } };
        let c2 = cont!{ "b" => { "c" => 20 }, "a" => 10 };
        let res = map_of(mapper().apply("add", &[c1.view(), c2.view()]).unwrap());
        assert_eq!(res, cont!{ "a" => 11, "b" => { "c" => 22 } });
        assert_eq!(res.keys().collect_vec(), vec!["a", "b"]);
    }

    #[test]
    fn extra_secondary_keys_ignored() {
        let c1 = cont!{ "a" => 1 };
        let c2 = cont!{ "a" => 2, "z" => 3 };
        let res = map_of(mapper().apply("mul", &[c1.view(), c2.view()]).unwrap());
        assert_eq!(res, cont!{ "a" => 2 });
    }

    #[test]
    fn broadcast_leaf() {
        let c = sample();
        let ten = 10;
        let res = map_of(mapper().apply("mul", &[c.view(), ValueRef::leaf(&ten)]).unwrap());
        assert_eq!(res, cont!{
            "a" => 10,
            "b" => { "c" => 20, "d" => 30 },
            "e" => { "f" => { "g" => 40 } }
        });
    }

    #[test]
    fn container_not_first() {
        let c = cont!{ "a" => 1, "b" => 2 };
        let hundred = 100;
        let res = map_of(mapper().apply("add", &[ValueRef::leaf(&hundred), c.view()]).unwrap());
        assert_eq!(res, cont!{ "a" => 101, "b" => 102 });
    }

    #[test]
    fn leaf_broadcast_into_subtree() {
        let c1 = cont!{ "a" => { "x" => 1, "y" => 2 } };
        let c2 = cont!{ "a" => 5 };
        let res = map_of(mapper().apply("add", &[c1.view(), c2.view()]).unwrap());
        assert_eq!(res, cont!{ "a" => { "x" => 6, "y" => 7 } });
    }

    #[test]
    fn no_container() {
        let (x, y) = (3, 4);
        let res = mapper().apply("mul", &[ValueRef::leaf(&x), ValueRef::leaf(&y)]).unwrap();
        assert_eq!(res, Value::Leaf(12));
    }

    #[test]
    fn empty_container() {
        let c: Container<i64> = Container::new();
        let m = Mapper::new(FnBackend::new(|_: &str, _: &[&i64]| -> Result<i64, StubError> {
            panic!("backend must not be called")
        }));
        let res = m.apply("id", &[c.view()]).unwrap();
        assert_eq!(res, Value::Map(Container::new()));
    }

    #[test]
    fn empty_subcontainer_kept() {
        let c = cont!{ "a" => 1, "b" => { } };
        let res = map_of(mapper().apply("id", &[c.view()]).unwrap());
        assert_eq!(res, c);
    }

    #[test]
    fn only_selected() {
        let c = sample();
        let m = mapper().with_selector(Selector::only(["b/c", "e"]));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res, cont!{
            "a" => 1,
            "b" => { "c" => -2, "d" => 3 },
            "e" => { "f" => { "g" => -4 } }
        });
    }

    #[test]
    fn exclusion() {
        let c = sample();
        let m = mapper().with_selector(Selector::except(["a", "b/d"]));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res, cont!{
            "a" => 1,
            "b" => { "c" => -2, "d" => 3 },
            "e" => { "f" => { "g" => -4 } }
        });
    }

    #[test]
    fn exclusion_pruned() {
        let c = sample();
        let m = mapper().with_selector(Selector::except(["a", "b/d"]).prune_unapplied(true));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res, cont!{
            "b" => { "c" => -2 },
            "e" => { "f" => { "g" => -4 } }
        });
    }

    #[test]
    fn pruning_drops_emptied_containers() {
        let c = sample();
        let m = mapper().with_selector(Selector::only(["a"]).prune_unapplied(true));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res, cont!{ "a" => -1 });
    }

    #[test]
    fn rename() {
        let c = sample();
        let m = mapper().with_selector(Selector::rename([("a", "z"), ("b/c", "b/cc")]).prune_unapplied(true));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res, cont!{ "z" => -1, "b" => { "cc" => -2 } });
    }

    #[test]
    fn rename_keeps_unapplied() {
        let c = cont!{ "a" => 1, "b" => 2 };
        let m = mapper().with_selector(Selector::rename([("a", "x/y")]));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res, cont!{ "b" => 2, "x" => { "y" => -1 } });
    }

    #[test]
    fn rename_drops_emptied_parent() {
        let c = cont!{ "a" => 1, "b" => { "c" => 2, "d" => 3 } };
        let m = mapper().with_selector(Selector::rename([("b/c", "z")]).prune_unapplied(true));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res, cont!{ "z" => -2 });

        let m = mapper().with_selector(Selector::rename([("b/c", "z")]));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res, cont!{ "a" => 1, "b" => { "d" => 3 }, "z" => -2 });
    }

    #[test]
    fn rename_from_sequence() {
        let mut c = Container::new();
        c.insert("s", Value::Seq(vec![Value::Leaf(1), Value::Leaf(2)]));
        let cfg = MapConfig::default().map_sequences(true);

        let m = mapper().with_config(cfg).with_selector(Selector::rename([("s/0", "x")]));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res.get("x"), Some(&Value::Leaf(-1)));
        assert_eq!(res.get("s"), Some(&Value::Seq(vec![Value::Leaf(2)])));

        let m = mapper().with_config(cfg).with_selector(Selector::rename([("s/0", "x"), ("s/1", "y")]));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res, cont!{ "x" => -1, "y" => -2 });
    }

    #[test]
    fn rename_out_of_top_level_sequence() {
        let s = vec![Value::Leaf(1), Value::Leaf(2)];
        let m = mapper()
            .with_config(MapConfig::default().map_sequences(true))
            .with_selector(Selector::rename([("0", "x")]));
        let err = m.apply("neg", &[ValueRef::Seq(&s)]).unwrap_err();
        assert!(matches!(err, MapError::Rename { .. }));
        assert_eq!(err.path(), &KeyChain::parse("0"));
    }

    #[test]
    fn sequence_facing_leaf() {
        let c = cont!{ "a" => 1 };
        let s = vec![Value::Leaf(5)];
        let err = mapper().apply("add", &[c.view(), ValueRef::Seq(&s)]).unwrap_err();
        assert!(matches!(err, MapError::KeyMismatch { arg: 1, .. }));
        assert_eq!(err.path(), &KeyChain::parse("a"));
    }

    #[test]
    fn container_facing_leaf() {
        let c1 = cont!{ "a" => 1, "b" => 2 };
        let c2 = cont!{ "a" => { "x" => 1 }, "b" => 3 };
        let err = mapper().apply("add", &[c1.view(), c2.view()]).unwrap_err();
        assert!(matches!(err, MapError::KeyMismatch { arg: 1, .. }));
        assert_eq!(err.path(), &KeyChain::parse("a"));

        let m = mapper().with_selector(Selector::only(["b"]));
        let res = map_of(m.apply("add", &[c1.view(), c2.view()]).unwrap());
        assert_eq!(res, cont!{ "a" => 1, "b" => 5 });
    }

    #[test]
    #[should_panic(expected = "no arguments given")]
    fn no_arguments() {
        let _ = mapper().apply::<i64>("id", &[]);
    }

    #[test]
    fn missing_key_skipped() {
        let c1 = cont!{ "a" => 1, "b" => 2 };
        let c2 = cont!{ "a" => 10 };
        let res = map_of(mapper().apply("add", &[c1.view(), c2.view()]).unwrap());
        assert_eq!(res, cont!{ "a" => 11, "b" => 2 });

        let m = mapper().with_selector(Selector::all().prune_unapplied(true));
        let res = map_of(m.apply("add", &[c1.view(), c2.view()]).unwrap());
        assert_eq!(res, cont!{ "a" => 11 });
    }

    #[test]
    fn missing_key_strict() {
        let c1 = cont!{ "a" => 1, "b" => { "c" => 2 } };
        let c2 = cont!{ "a" => 10, "b" => { } };
        let m = mapper().with_config(MapConfig::default().assert_identical(true));
        let err = m.apply("add", &[c1.view(), c2.view()]).unwrap_err();
        match err {
            MapError::KeyMismatch { op, path, arg } => {
                assert_eq!(op, "add");
                assert_eq!(path, KeyChain::parse("b/c"));
                assert_eq!(arg, 1);
            },
            e => panic!("unexpected error: {e}")
        }
    }

    #[test]
    fn missing_key_strict_but_unselected() {
        let c1 = cont!{ "a" => 1, "b" => 2 };
        let c2 = cont!{ "a" => 10 };
        let m = mapper()
            .with_config(MapConfig::default().assert_identical(true))
            .with_selector(Selector::only(["a"]));
        let res = map_of(m.apply("add", &[c1.view(), c2.view()]).unwrap());
        assert_eq!(res, cont!{ "a" => 11, "b" => 2 });
    }

    #[test]
    fn structure_mismatch_strict() {
        let c1 = cont!{ "a" => 1 };
        let c2 = cont!{ "a" => { "x" => 1 } };
        let m = mapper().with_config(MapConfig::default().assert_identical(true));
        let err = m.apply("add", &[c1.view(), c2.view()]).unwrap_err();
        assert!(matches!(err, MapError::KeyMismatch { arg: 1, .. }));
        assert_eq!(err.path(), &KeyChain::parse("a"));
    }

    #[test]
    fn backend_error_propagates() {
        let c = cont!{ "a" => 1, "b" => { "c" => -2 } };
        let err = mapper().apply("fail_neg", &[c.view()]).unwrap_err();
        assert_eq!(err.op(), "fail_neg");
        assert_eq!(err.path(), &KeyChain::parse("b/c"));
        assert_eq!(err.backend_error(), Some(&StubError("negative: -2".into())));
    }

    #[test]
    fn sequences_unmapped() {
        let mut c = cont!{ "a" => 1 };
        c.insert("s", Value::Seq(vec![Value::Leaf(2), Value::Leaf(3)]));
        let res = map_of(mapper().apply("neg", &[c.view()]).unwrap());
        assert_eq!(res.get("a"), Some(&Value::Leaf(-1)));
        assert_eq!(res.get("s"), Some(&Value::Seq(vec![Value::Leaf(2), Value::Leaf(3)])));
    }

    #[test]
    fn sequences_mapped() {
        let mut c = cont!{ "a" => 1 };
        c.insert("s", Value::Seq(vec![Value::Leaf(2), Value::Map(cont!{ "t" => 3 })]));
        let m = mapper().with_config(MapConfig::default().map_sequences(true));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res.get("s"), Some(&Value::Seq(vec![Value::Leaf(-2), Value::Map(cont!{ "t" => -3 })])));
    }

    #[test]
    fn sequences_lockstep() {
        let mut c1 = Container::new();
        c1.insert("s", Value::Seq(vec![Value::Leaf(1), Value::Leaf(2)]));
        let mut c2 = Container::new();
        c2.insert("s", Value::Seq(vec![Value::Leaf(10), Value::Leaf(20)]));
        let m = mapper().with_config(MapConfig::default().map_sequences(true));
        let res = map_of(m.apply("add", &[c1.view(), c2.view()]).unwrap());
        assert_eq!(res.get("s"), Some(&Value::Seq(vec![Value::Leaf(11), Value::Leaf(22)])));
    }

    #[test]
    fn sequence_selected_by_position() {
        let mut c = Container::new();
        c.insert("s", Value::Seq(vec![Value::Leaf(1), Value::Leaf(2)]));
        let m = mapper()
            .with_config(MapConfig::default().map_sequences(true))
            .with_selector(Selector::only(["s/1"]));
        let res = map_of(m.apply("neg", &[c.view()]).unwrap());
        assert_eq!(res.get("s"), Some(&Value::Seq(vec![Value::Leaf(1), Value::Leaf(-2)])));
    }

    #[test]
    fn apply_into_returns_out() {
        let c = cont!{ "a" => 1, "b" => { "c" => 2 } };
        let mut out = cont!{ "a" => 0, "b" => { "c" => 0 }, "z" => 99 };
        let out_ptr: *const Container<i64> = &out;

        let res = mapper().apply_into("neg", &[c.view()], &mut out).unwrap();
        assert!(std::ptr::eq(res, out_ptr));
        assert_eq!(out, cont!{ "a" => -1, "b" => { "c" => -2 }, "z" => 99 });
    }

    #[test]
    fn apply_into_keeps_untouched() {
        let c = cont!{ "a" => 1, "b" => 2 };
        let mut out = cont!{ "a" => 7, "b" => 8 };
        let m = mapper().with_selector(Selector::except(["b"]));
        m.apply_into("neg", &[c.view()], &mut out).unwrap();
        assert_eq!(out, cont!{ "a" => -1, "b" => 8 });
    }

    #[test]
    fn apply_into_inserts_missing() {
        let c = cont!{ "a" => 1, "b" => { "c" => 2 } };
        let mut out = Container::new();
        mapper().apply_into("neg", &[c.view()], &mut out).unwrap();
        assert_eq!(out, cont!{ "a" => -1, "b" => { "c" => -2 } });
    }

    #[test]
    fn apply_into_shape_mismatch() {
        let c = cont!{ "a" => 1, "b" => 2 };
        let mut out = cont!{ "a" => 0, "b" => { "x" => 5 } };
        let err = mapper().apply_into("neg", &[c.view()], &mut out).unwrap_err();
        assert!(matches!(err, MapError::OutputShape { .. }));
        assert_eq!(err.path(), &KeyChain::parse("b"));
        assert_eq!(out, cont!{ "a" => 0, "b" => { "x" => 5 } });
    }

    #[test]
    fn apply_into_backend_error_leaves_out_untouched() {
        let c = cont!{ "a" => 1, "b" => -2 };
        let mut out = cont!{ "a" => 0, "b" => 0 };
        let res = mapper().apply_into("fail_neg", &[c.view()], &mut out);
        assert!(res.is_err());
        assert_eq!(out, cont!{ "a" => 0, "b" => 0 });
    }

    #[test]
    fn apply_into_vec_leaves() {
        let b = FnBackend::new(|_: &str, args: &[&Vec<i64>]| -> Result<Vec<i64>, StubError> {
            Ok(args[0].iter().map(|x| x * 2).collect())
        });
        let mut c = Container::new();
        c.insert_leaf("a", vec![1, 2]);
        let mut out = Container::new();
        out.insert_leaf("a", vec![0]);
        let err = Mapper::new(b).apply_into("double", &[c.view()], &mut out).unwrap_err();
        match err {
            MapError::OutputShape { mismatch, .. } => assert_eq!(mismatch, ShapeMismatch::new("[1]", "[2]")),
            e => panic!("unexpected error: {e}")
        }
    }
}
