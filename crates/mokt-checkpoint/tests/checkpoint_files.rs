//! Reading real `.safetensors` files written to a temp directory.

use half::{bf16, f16};
use mokt_checkpoint::{CheckpointError, ReferenceSet, SafeTensorsCheckpoint, TensorSource};
use mokt_common::HostArray;
use safetensors::tensor::TensorView;
use safetensors::Dtype;
use std::path::Path;

fn le_bytes_f32(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn write(path: &Path, tensors: &[(&str, Dtype, Vec<usize>, &[u8])]) {
    let views: Vec<(&str, TensorView<'_>)> = tensors
        .iter()
        .map(|(name, dtype, shape, data)| (*name, TensorView::new(*dtype, shape.clone(), data).unwrap()))
        .collect();
    let bytes = safetensors::serialize(views, &None).unwrap();
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn single_file_lookup_flattens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.safetensors");
    let x = le_bytes_f32(&[1.0, 2.0, 3.0, 4.0]);
    write(&path, &[("dense/MatMul", Dtype::F32, vec![2, 2], &x[..])]);

    let ckpt = SafeTensorsCheckpoint::open(&path).unwrap();
    assert_eq!(ckpt.shard_count(), 1);
    assert_eq!(ckpt.names(), vec!["dense/MatMul"]);
    let tensor = ckpt.load_tensor("dense/MatMul").unwrap();
    assert_eq!(tensor, HostArray::from(vec![1.0f32, 2.0, 3.0, 4.0]));
}

#[test]
fn output_suffix_falls_back_to_bare_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.safetensors");
    let relu = le_bytes_f32(&[0.0, 0.0, 3.5]);
    write(&path, &[("dense/Relu", Dtype::F32, vec![3], &relu[..])]);

    let ckpt = SafeTensorsCheckpoint::open(&path).unwrap();
    let tensor = ckpt.load_tensor("dense/Relu:0").unwrap();
    assert_eq!(tensor.len(), 3);
}

#[test]
fn directory_of_shards_is_searched() {
    let dir = tempfile::tempdir().unwrap();
    let a = le_bytes_f32(&[1.0]);
    let b: Vec<u8> = [7i32, -7].iter().flat_map(|v| v.to_le_bytes()).collect();
    write(&dir.path().join("model-00001.safetensors"), &[("a", Dtype::F32, vec![1], &a[..])]);
    write(&dir.path().join("model-00002.safetensors"), &[("b", Dtype::I32, vec![2], &b[..])]);
    std::fs::write(dir.path().join("README.txt"), "not a shard").unwrap();

    let ckpt = SafeTensorsCheckpoint::open(dir.path()).unwrap();
    assert_eq!(ckpt.shard_count(), 2);
    assert_eq!(ckpt.load_tensor("b").unwrap(), HostArray::from(vec![7i32, -7]));

    let set = ReferenceSet::load(&ckpt, &["a"], &["b"]).unwrap();
    assert_eq!(set.inputs[0].len(), 1);
    assert_eq!(set.expected[0].len(), 2);

    let err = ckpt.load_tensor("c").unwrap_err();
    assert!(matches!(err, CheckpointError::TensorNotFound { shards: 2, .. }));
}

#[test]
fn half_precision_widens_to_f32() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("half.safetensors");
    let h: Vec<u8> = [f16::from_f32(1.5), f16::from_f32(-2.0)]
        .iter()
        .flat_map(|v| v.to_bits().to_le_bytes())
        .collect();
    let b: Vec<u8> = [bf16::from_f32(0.25)].iter().flat_map(|v| v.to_bits().to_le_bytes()).collect();
    let flags = [1u8, 0, 1];
    write(
        &path,
        &[
            ("h", Dtype::F16, vec![2], &h[..]),
            ("b", Dtype::BF16, vec![1], &b[..]),
            ("mask", Dtype::BOOL, vec![3], &flags[..]),
        ],
    );

    let ckpt = SafeTensorsCheckpoint::open(&path).unwrap();
    assert_eq!(ckpt.load_tensor("h").unwrap(), HostArray::from(vec![1.5f32, -2.0]));
    assert_eq!(ckpt.load_tensor("b").unwrap(), HostArray::from(vec![0.25f32]));
    assert_eq!(ckpt.load_tensor("mask").unwrap(), HostArray::from(vec![1u8, 0, 1]));
}

#[test]
fn open_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SafeTensorsCheckpoint::open(dir.path().join("missing.safetensors")),
        Err(CheckpointError::NotFound { .. })
    ));
    assert!(matches!(
        SafeTensorsCheckpoint::open(dir.path()),
        Err(CheckpointError::EmptyDirectory { .. })
    ));

    let junk = dir.path().join("junk.safetensors");
    std::fs::write(&junk, b"definitely not safetensors").unwrap();
    assert!(matches!(SafeTensorsCheckpoint::open(&junk), Err(CheckpointError::Malformed { .. })));
}
