use sprite_baker_core::prelude::*;
use std::fs;
use std::path::Path;

fn write_file(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, text).expect("write");
}

#[test]
fn only_untouched_outputs_are_removed() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    write_file(&src.join("A.txt"), "a");
    write_file(&src.join("B.txt"), "b");
    write_file(&dst.join("A.txt"), "old a");
    write_file(&dst.join("B.txt"), "old b");
    write_file(&dst.join("C.txt"), "c");

    let cfg = BuildConfig::builder().source_dir(&src).target_dir(&dst).build();
    let report = ContentBuilder::new(cfg).build().expect("build");
    assert_eq!(report.removed, 1);
    assert!(dst.join("A.txt").is_file());
    assert!(dst.join("B.txt").is_file());
    assert!(!dst.join("C.txt").exists());
}

#[test]
fn stale_directories_go_with_their_subtree() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    write_file(&src.join("keep/file.txt"), "k");
    write_file(&dst.join("gone/deep/er/x.txt"), "x");
    write_file(&dst.join("gone/y.txt"), "y");
    write_file(&dst.join("keep/stale.txt"), "s");

    let cfg = BuildConfig::builder().source_dir(&src).target_dir(&dst).build();
    let report = ContentBuilder::new(cfg).build().expect("build");
    // one directory plus one file
    assert_eq!(report.removed, 2);
    assert!(!dst.join("gone").exists());
    assert!(!dst.join("keep/stale.txt").exists());
    assert!(dst.join("keep/file.txt").is_file());
}

#[test]
fn deleted_source_files_disappear_from_the_target() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    write_file(&src.join("maps/one.tmx"), "1");
    write_file(&src.join("maps/two.tmx"), "2");
    let cfg = BuildConfig::builder().source_dir(&src).target_dir(&dst).build();
    let mut builder = ContentBuilder::new(cfg);
    builder.build().expect("first build");

    fs::remove_dir_all(src.join("maps")).expect("rm");
    let report = builder.build().expect("second build");
    assert_eq!(report.removed, 1);
    assert!(!dst.join("maps").exists());
    assert!(dst.is_dir());
}

#[test]
fn empty_source_keeps_the_target_root() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    fs::create_dir_all(&src).expect("mkdir");
    write_file(&dst.join("junk.bin"), "j");

    let cfg = BuildConfig::builder().source_dir(&src).target_dir(&dst).build();
    ContentBuilder::new(cfg).build().expect("build");
    assert!(dst.is_dir());
    assert_eq!(fs::read_dir(&dst).expect("read_dir").count(), 0);
}

#[test]
fn preserved_paths_survive_the_sweep() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    write_file(&src.join("a.txt"), "a");
    write_file(&dst.join("saves/slot1/state.dat"), "1");
    write_file(&dst.join("cache/shaders.bin"), "s");
    write_file(&dst.join("stray.txt"), "x");

    let cfg = BuildConfig::builder()
        .source_dir(&src)
        .target_dir(&dst)
        .preserve("saves")
        .build();
    let mut builder = ContentBuilder::new(cfg);
    let report = builder.build().expect("build");
    assert_eq!(report.removed, 2);
    assert!(dst.join("saves/slot1/state.dat").is_file());
    assert!(!dst.join("cache").exists());
    assert!(!dst.join("stray.txt").exists());
    assert!(builder.touched().is_empty());
}
