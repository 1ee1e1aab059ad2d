//! Property tests for the host reference implementations.

use mokt_common::HostArray;
use mokt_ops::{Operation, OperationRegistry};
use proptest::prelude::*;

fn finite_vec(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0e6f32..1.0e6, len)
}

fn single(op: &dyn Operation, input: Vec<f32>) -> Vec<f64> {
    let out = op.host_reference(&[HostArray::from(input)]).unwrap();
    out[0].to_f64_vec()
}

proptest! {
    #[test]
    fn add_is_commutative(pair in (1usize..256).prop_flat_map(|n| (finite_vec(n..n + 1), finite_vec(n..n + 1)))) {
        let registry = OperationRegistry::default();
        let add = registry.require("add").unwrap();
        let (a, b) = pair;
        let ab = add.host_reference(&[a.clone().into(), b.clone().into()]).unwrap();
        let ba = add.host_reference(&[b.into(), a.into()]).unwrap();
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn relu_is_non_negative_and_idempotent(input in finite_vec(1..512)) {
        let registry = OperationRegistry::default();
        let relu = registry.require("relu").unwrap();
        let once = single(relu, input);
        prop_assert!(once.iter().all(|&x| x >= 0.0));
        let twice = single(relu, once.iter().map(|&x| x as f32).collect());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn copy_bytes_preserves_length(input in finite_vec(1..128)) {
        let registry = OperationRegistry::default();
        let copy = registry.require("copy_bytes").unwrap();
        let array = HostArray::from(input);
        let out = copy.host_reference(std::slice::from_ref(&array)).unwrap();
        prop_assert_eq!(out[0].len(), array.nbytes());
        prop_assert_eq!(copy.output_descriptors(std::slice::from_ref(&array))[0], out[0].descriptor());
    }
}
