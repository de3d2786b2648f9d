use rand::{Rng, SeedableRng, XorShiftRng};
use red_black_map::RedBlackMap;
use std::collections::BTreeMap;

#[test]
fn int_test_ascending_insertions() {
    let mut map = RedBlackMap::new();
    for key in 1..=15 {
        map.insert(key, key * 10);
        assert!(map.validate().is_ok(), "invalid after inserting {}", key);
    }
    assert_eq!(
        map.traverse().into_iter().cloned().collect::<Vec<u32>>(),
        (1..=15).collect::<Vec<u32>>(),
    );
}

#[test]
fn int_test_remove_root_of_balanced_map() {
    let mut map = RedBlackMap::new();
    for key in &[8, 4, 12, 2, 6, 10, 14, 1, 3, 5, 7, 9, 11, 13, 15] {
        map.insert(*key, *key);
    }
    assert_eq!(map.validate(), Ok(2));

    assert_eq!(map.remove(&8), Some((8, 8)));
    assert!(map.validate().is_ok());
    assert_eq!(
        map.traverse().into_iter().cloned().collect::<Vec<u32>>(),
        (1..=7).chain(9..=15).collect::<Vec<u32>>(),
    );
    assert_eq!(map.get(&8), None);
}

#[test]
fn int_test_height_is_logarithmic() {
    let mut map = RedBlackMap::new();
    for key in 0..(1 << 12) {
        map.insert(key, ());
    }
    // a red black tree with n nodes has black height at most log2(n + 1)
    let black_height = map.validate().expect("Expected a valid tree.");
    assert!(black_height <= 13, "black height {} is too large", black_height);
}

#[test]
fn int_test_random_operations() {
    let mut rng: XorShiftRng = SeedableRng::from_seed([1, 2, 3, 4]);
    let mut map = RedBlackMap::with_chunk_size(64);
    let mut expected = BTreeMap::new();

    for i in 0..20_000 {
        let key = rng.gen_range(0u32, 2048);
        if rng.gen::<bool>() {
            let value = rng.gen::<u32>();
            assert_eq!(
                map.insert(key, value).map(|pair| pair.1),
                expected.insert(key, value),
            );
        } else {
            assert_eq!(
                map.remove(&key).map(|pair| pair.1),
                expected.remove(&key),
            );
        }

        if i % 500 == 0 {
            assert!(map.validate().is_ok(), "invalid after operation {}", i);
        }
    }

    assert!(map.validate().is_ok());
    assert_eq!(map.len(), expected.len());
    for (key, value) in &expected {
        assert_eq!(map.get(key), Some(value));
    }
    assert_eq!(
        map.into_iter().collect::<Vec<(u32, u32)>>(),
        expected.into_iter().collect::<Vec<(u32, u32)>>(),
    );
}

#[test]
fn int_test_drain_in_random_order() {
    let mut rng = rand::thread_rng();
    let mut map = RedBlackMap::new();
    let mut keys = Vec::new();
    for _ in 0..5000 {
        let key = rng.gen::<u32>();
        if map.insert(key, key).is_none() {
            keys.push(key);
        }
    }
    rng.shuffle(&mut keys);

    for (i, key) in keys.iter().enumerate() {
        assert_eq!(map.remove(key), Some((*key, *key)));
        assert_eq!(map.remove(key), None);
        if i % 250 == 0 {
            assert!(map.validate().is_ok());
        }
    }
    assert!(map.is_empty());
    assert_eq!(map.validate(), Ok(0));
}
