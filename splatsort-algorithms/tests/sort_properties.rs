use rand::{rngs::StdRng, Rng, SeedableRng};
use splatsort_algorithms::{
    bitonic_order, check_against_reference, check_bijection, check_monotonic, depths_in_order, execute_plan,
    reference_order, SortPlan,
};
use splatsort_core::IndexPermutation;

fn random_depths(rng: &mut StdRng, n: usize) -> Vec<f32> {
    // a narrow integer range forces plenty of ties
    if rng.gen_bool(0.3) {
        (0..n).map(|_| rng.gen_range(0..8) as f32).collect()
    } else {
        (0..n).map(|_| rng.gen_range(-100.0..100.0)).collect()
    }
}

#[test]
fn bitonic_output_is_a_sorted_permutation() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for n in 0..70 {
        let depths = random_depths(&mut rng, n);
        let perm = bitonic_order(&depths).unwrap();
        assert_eq!(perm.len(), n);
        check_bijection(perm.as_slice()).unwrap();
        check_monotonic(&depths, perm.as_slice()).unwrap();
    }
}

#[test]
fn bitonic_agrees_with_reference_sort() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..60 {
        let n = rng.gen_range(2..=1000);
        let depths = random_depths(&mut rng, n);

        let parallel = bitonic_order(&depths).unwrap();
        let sequential = reference_order(&depths).unwrap();

        assert_eq!(
            depths_in_order(&depths, parallel.as_slice()),
            depths_in_order(&depths, sequential.as_slice()),
            "n = {}",
            n
        );
        check_against_reference(&depths, parallel.as_slice()).unwrap();
    }
}

#[test]
fn warm_started_sort_stays_correct() {
    // frame-to-frame reuse: the previous order is the next sort's input
    let mut rng = StdRng::seed_from_u64(9);
    let n = 777;
    let plan = SortPlan::new(n).unwrap();
    let mut perm = IndexPermutation::identity(n).unwrap();
    for _ in 0..10 {
        let depths = random_depths(&mut rng, n);
        execute_plan(&plan, &depths, &mut perm).unwrap();
        check_bijection(perm.as_slice()).unwrap();
        check_monotonic(&depths, perm.as_slice()).unwrap();
    }
}

#[test]
fn resorting_unchanged_depths_swaps_nothing() {
    let mut rng = StdRng::seed_from_u64(3);
    for n in [1usize, 2, 5, 64, 100, 513] {
        let depths = random_depths(&mut rng, n);
        let plan = SortPlan::new(n).unwrap();
        let mut perm = IndexPermutation::identity(n).unwrap();
        execute_plan(&plan, &depths, &mut perm).unwrap();
        let before = perm.clone();
        execute_plan(&plan, &depths, &mut perm).unwrap();
        assert_eq!(before, perm, "n = {}", n);
    }
}

#[test]
fn power_of_two_boundaries() {
    let mut rng = StdRng::seed_from_u64(17);
    for exp in 1..12 {
        for n in [(1usize << exp) - 1, 1 << exp, (1 << exp) + 1] {
            let depths = random_depths(&mut rng, n);
            let perm = bitonic_order(&depths).unwrap();
            check_monotonic(&depths, perm.as_slice()).unwrap();
        }
    }
}
