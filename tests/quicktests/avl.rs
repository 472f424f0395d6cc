use avl_balancer::AvlTreeMap;

use std::collections::{BTreeMap, HashSet};

use crate::Op;

fn avl_height_bound(len: usize) -> f64 {
    1.44 * ((len + 2) as f64).log2() - 0.328
}

fn is_strictly_increasing<K: Ord, V>(map: &AvlTreeMap<K, V>) -> bool {
    let keys: Vec<&K> = map.keys().collect();
    keys.windows(2).all(|pair| pair[0] < pair[1])
}

/// Applies a set of operations to an AVL map and a `BTreeMap` model, checking
/// after every step that both agree and that the tree stays balanced.
fn do_ops<K, V>(ops: &[Op<K, V>], map: &mut AvlTreeMap<K, V>, model: &mut BTreeMap<K, V>) -> bool
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    for op in ops {
        let agrees = match op {
            Op::Insert(k, v) => map.insert(k.clone(), v.clone()) == model.insert(k.clone(), v.clone()),
            Op::Remove(k) => map.remove(k) == model.remove(k),
        };
        if !agrees || !map.is_balanced() || map.len() != model.len() {
            return false;
        }
    }
    true
}

#[quickcheck]
fn fuzz_multiple_operations_i8(ops: Vec<Op<i8, i8>>) -> bool {
    let mut map = AvlTreeMap::new();
    let mut model = BTreeMap::new();

    do_ops(&ops, &mut map, &mut model)
        && is_strictly_increasing(&map)
        && map.iter().eq(model.iter())
}

#[quickcheck]
fn fuzz_multiple_operations_u16(ops: Vec<Op<u16, u8>>) -> bool {
    let mut map = AvlTreeMap::new();
    let mut model = BTreeMap::new();

    do_ops(&ops, &mut map, &mut model) && map.iter().eq(model.iter())
}

#[quickcheck]
fn height_is_logarithmic(xs: Vec<i32>) -> bool {
    let mut map = AvlTreeMap::new();
    xs.iter().all(|x| {
        map.insert(*x, ());
        map.height() as f64 <= avl_height_bound(map.len())
    })
}

#[quickcheck]
fn contains(xs: Vec<i8>) -> bool {
    let mut map = AvlTreeMap::new();
    for x in &xs {
        map.insert(*x, *x);
    }

    xs.iter().all(|x| map.get(x) == Some(x))
}

#[quickcheck]
fn contains_not(xs: Vec<i8>, nots: Vec<i8>) -> bool {
    let mut map = AvlTreeMap::new();
    for x in &xs {
        map.insert(*x, *x);
    }
    let added: HashSet<_> = xs.into_iter().collect();
    let nots: HashSet<_> = nots.into_iter().collect();
    let mut nots = nots.difference(&added);

    nots.all(|x| map.get(x).is_none() && map.at(x).is_err())
}

#[quickcheck]
fn with_deletions(xs: Vec<i8>, deletes: Vec<i8>) -> bool {
    let mut map = AvlTreeMap::new();
    for x in &xs {
        map.insert(*x, *x);
    }
    for delete in &deletes {
        map.remove(delete);
    }

    let mut still_present = xs;
    for delete in &deletes {
        // We may have inserted the same value multiple times - delete each one.
        while let Some(pos) = still_present.iter().position(|x| x == delete) {
            still_present.swap_remove(pos);
        }
    }

    map.is_balanced()
        && deletes.iter().all(|x| map.get(x).is_none())
        && still_present.iter().all(|x| map.get(x).is_some())
}

#[quickcheck]
fn insert_then_remove_keeps_key_set(xs: Vec<i16>, fresh: i16) -> bool {
    let mut map: AvlTreeMap<i16, ()> = xs.iter().map(|x| (*x, ())).collect();
    if map.contains_key(&fresh) {
        return true;
    }
    let before: Vec<i16> = map.keys().copied().collect();
    map.insert(fresh, ());
    map.remove(&fresh);

    map.is_balanced() && map.keys().copied().eq(before)
}
