use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ssql::sampling::{
    composite_hash, hash_component, level_bound, level_for_hash, HASH_P, MAX_LEVELS,
};

fn admitted(h: u32, target: u32) -> bool {
    i32::from(level_for_hash(h)) <= level_bound(target)
}

#[test]
fn test_level_filter_admits_hash_prefix() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut hashes: Vec<u32> = (0..5000).map(|_| rng.random_range(0..HASH_P as u32)).collect();
    for bit in 0..31 {
        let edge = 1u32 << bit;
        hashes.extend([edge - 1, edge, edge + 1]);
    }
    hashes.push(HASH_P as u32 - 1);

    for target in 0..MAX_LEVELS {
        let limit = 1u64 << (31 - target);
        for &h in &hashes {
            assert_eq!(
                admitted(h, target),
                u64::from(h) < limit,
                "hash {h} at target {target}"
            );
        }
    }
}

#[test]
fn test_every_level_admits_previous_sample() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..2000 {
        let h = hash_component(0, rng.random()).unwrap();
        for target in 1..MAX_LEVELS {
            if admitted(h, target) {
                assert!(admitted(h, target - 1));
            }
        }
    }
}

#[test]
fn test_hash_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let x: i64 = rng.random();
        let index = rng.random_range(0..255);
        assert_eq!(hash_component(index, x).unwrap(), hash_component(index, x).unwrap());
        assert_eq!(
            composite_hash(index.min(250), &[x, x.wrapping_add(1)]).unwrap(),
            composite_hash(index.min(250), &[x, x.wrapping_add(1)]).unwrap()
        );
    }
    // only the low 32 bits of a key take part
    assert_eq!(hash_component(4, 5).unwrap(), hash_component(4, 5 + (1 << 32)).unwrap());
}

#[test]
fn test_target_three_keeps_about_an_eighth() {
    let mut rng = StdRng::seed_from_u64(42);
    let kept = (0..20_000)
        .map(|_| hash_component(0, rng.random_range(0..i64::from(u32::MAX))).unwrap())
        .filter(|&h| admitted(h, 3))
        .count();
    assert!((2000..3000).contains(&kept), "kept {kept}");
}

#[test]
fn test_parameter_index_is_bounded() {
    assert!(hash_component(254, 1).is_ok());
    assert!(hash_component(255, 1).is_err());
}
