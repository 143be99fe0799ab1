// tests/task_identity.rs

//! Task keys are structural identity; targets are pure existence predicates.

use std::collections::HashMap;
use std::io::{Read as _, Write as _};
use std::path::Path;
use std::sync::Arc;

use targetdag::fs::mock::MockFileSystem;
use targetdag::fs::FileSystem;
use targetdag::target::{CompositeTarget, DirTarget, FileTarget, Target};
use targetdag::task::{ParamValue, TaskKey};

#[test]
fn equal_inputs_make_equal_keys() {
    let a = TaskKey::new("train", vec![ParamValue::from("cnn"), ParamValue::from(3u32)]);
    let b = TaskKey::new("train", vec![ParamValue::from("cnn"), ParamValue::from(3u32)]);
    assert_eq!(a, b);

    // Usable as a map key: both spellings land on the same entry.
    let mut map = HashMap::new();
    map.insert(a, 1);
    *map.entry(b).or_insert(0) += 1;
    assert_eq!(map.len(), 1);
    assert_eq!(map.values().copied().sum::<i32>(), 2);
}

#[test]
fn different_params_or_family_make_different_keys() {
    let base = TaskKey::new("train", vec![ParamValue::from("cnn"), ParamValue::from(3u32)]);

    assert_ne!(
        base,
        TaskKey::new("train", vec![ParamValue::from("cnn"), ParamValue::from(4u32)])
    );
    assert_ne!(
        base,
        TaskKey::new("evaluate", vec![ParamValue::from("cnn"), ParamValue::from(3u32)])
    );
    // Parameter order matters.
    assert_ne!(
        base,
        TaskKey::new("train", vec![ParamValue::from(3u32), ParamValue::from("cnn")])
    );
}

#[test]
fn keys_render_family_and_params() {
    let key = TaskKey::new(
        "train",
        vec![
            ParamValue::from("cnn"),
            ParamValue::from(3u32),
            ParamValue::from(true),
        ],
    );
    assert_eq!(key.to_string(), "train(cnn, 3, true)");
    assert_eq!(TaskKey::new("fetch", Vec::new()).to_string(), "fetch()");
}

#[test]
fn file_target_existence_and_io() {
    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();
    let target = FileTarget::new(fs, "/data/models/cnn/v1/model.bin");

    assert!(!target.exists());

    // Checking existence must not create anything.
    assert!(mock.file_paths().is_empty());

    target.ensure_parent_exists().unwrap();
    assert!(mock.is_dir(Path::new("/data/models/cnn/v1")));
    assert!(!target.exists());

    // Idempotent.
    target.ensure_parent_exists().unwrap();

    target.open_write().unwrap().write_all(b"weights").unwrap();
    assert!(target.exists());

    let mut read_back = String::new();
    target.open_read().unwrap().read_to_string(&mut read_back).unwrap();
    assert_eq!(read_back, "weights");
}

#[test]
fn dir_target_tracks_directories_not_files() {
    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();
    let target = DirTarget::new(fs, "/data/datasets/flowers/v1/data");

    assert!(!target.exists());
    mock.add_file("/data/datasets/flowers/v1/data", "not a dir");
    assert!(!target.exists());

    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();
    let target = DirTarget::new(fs, "/data/datasets/flowers/v1/data");
    mock.add_dir("/data/datasets/flowers/v1/data");
    assert!(target.exists());
}

#[test]
fn composite_target_requires_every_part() {
    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();

    let model = Arc::new(FileTarget::new(fs.clone(), "/serving/cnn/1/model.bin"));
    let manifest = Arc::new(FileTarget::new(fs.clone(), "/serving/cnn/1/manifest.json"));
    let composite = CompositeTarget::new(vec![model, manifest]);

    assert!(!composite.exists());
    mock.add_file("/serving/cnn/1/model.bin", "weights");
    assert!(!composite.exists());
    mock.add_file("/serving/cnn/1/manifest.json", "{}");
    assert!(composite.exists());

    assert_eq!(composite.locator(), Path::new("/serving/cnn/1/model.bin"));
}
