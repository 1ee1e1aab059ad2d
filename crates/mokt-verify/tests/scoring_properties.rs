//! Property tests for accuracy and delta bookkeeping.

use mokt_common::{ExecutionTiming, HostArray};
use mokt_verify::{score, score_all, verify_and_profile, Tolerance};
use proptest::prelude::*;

fn values(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0e4f32..1.0e4, len)
}

proptest! {
    #[test]
    fn identical_outputs_are_fully_accurate(data in values(0..512)) {
        let array = HostArray::from(data);
        let report = score(&array, &array);
        prop_assert!(report.passed);
        prop_assert_eq!(report.accuracy, 1.0);
        prop_assert_eq!(report.mean_delta, 0.0);
        prop_assert!(report.mismatches.is_empty());
    }

    #[test]
    fn accuracy_counts_differing_elements(
        (data, flips) in (1usize..256).prop_flat_map(|n| (values(n..n + 1), prop::collection::vec(any::<bool>(), n)))
    ) {
        let n = data.len();
        let actual: Vec<f32> = data
            .iter()
            .zip(&flips)
            .map(|(&v, &flip)| if flip { v + 1.0 } else { v })
            .collect();
        let k = flips.iter().filter(|&&f| f).count();

        let report = score(&HostArray::from(data), &HostArray::from(actual));
        let want = (n - k) as f64 / n as f64;
        prop_assert!((report.accuracy - want).abs() < 1e-12);
        prop_assert_eq!(report.mismatch_count(), k);
        prop_assert_eq!(report.passed, k == 0);
        let expected_indices: Vec<usize> = flips
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect();
        prop_assert_eq!(report.mismatched_indices(), expected_indices);
    }

    #[test]
    fn integer_deltas_are_exact(
        (expected, actual) in (1usize..128).prop_flat_map(|n| (
            prop::collection::vec(-1000i32..1000, n),
            prop::collection::vec(-1000i32..1000, n),
        ))
    ) {
        let report = score(&HostArray::from(expected.clone()), &HostArray::from(actual.clone()));
        let deltas: Vec<f64> = expected
            .iter()
            .zip(&actual)
            .filter(|(e, a)| e != a)
            .map(|(e, a)| f64::from((e - a).abs()))
            .collect();
        let mean = if deltas.is_empty() { 0.0 } else { deltas.iter().sum::<f64>() / deltas.len() as f64 };
        prop_assert!((report.mean_delta - mean).abs() < 1e-9);
        prop_assert_eq!(report.deltas().len(), deltas.len());
    }
}

#[test]
fn one_element_doubled() {
    let inputs = vec![HostArray::from(vec![1.0f32])];
    let report = verify_and_profile(
        "scale2",
        ExecutionTiming::new(0, 2_000),
        &inputs,
        &[HostArray::from(vec![1.0f32])],
        &[HostArray::from(vec![2.0f32])],
        Tolerance::default(),
    );
    assert!(!report.passed());
    assert_eq!(report.outputs[0].accuracy, 0.0);
    assert_eq!(report.outputs[0].mean_delta, 1.0);
    assert_eq!(report.outputs[0].mismatched_indices(), vec![0]);
    assert_eq!(report.profile.bytes_moved, 8);
}

#[test]
fn each_output_scored_independently() {
    let expected = vec![HostArray::from(vec![1u8, 2, 3]), HostArray::from(vec![0.5f64])];
    let actual = vec![HostArray::from(vec![1u8, 2, 4]), HostArray::from(vec![0.5f64])];
    let reports = score_all(&expected, &actual, Tolerance::exact());
    assert!(!reports[0].passed);
    assert!(reports[1].passed);
    assert_eq!(reports[0].mismatched_indices(), vec![2]);
}
