use fileherd::{OpKind, OperationRequest, OverwritePolicy, StopFlag, engine};
use serial_test::serial;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn run_move(sources: Vec<PathBuf>, dests: Vec<PathBuf>, policy: OverwritePolicy) -> fileherd::Report {
    let request = OperationRequest::new(OpKind::Move, sources, dests, policy).unwrap();
    let stop = StopFlag::new();
    engine::run(&request, &stop, &mut |_| {}).unwrap()
}

fn collect_relative_files(root: &Path) -> HashSet<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

#[test]
#[serial]
fn moving_a_directory_into_itself_is_rejected_with_no_side_effects() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path().canonicalize().unwrap();
    let a = base.join("a");
    fs::create_dir(&a).unwrap();
    fs::write(a.join("file.txt"), b"x").unwrap();

    let report = run_move(vec![a.clone()], vec![a.join("b")], OverwritePolicy::Never);

    let rejected = report.rejected.expect("structural error expected");
    assert_eq!(rejected.title, "Invalid move");
    assert!(report.failed.is_empty());
    assert!(a.join("file.txt").exists(), "nothing may be mutated");
    assert!(!a.join("b").exists());
}

#[test]
#[serial]
fn same_device_move_renames_a_file() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path().canonicalize().unwrap();
    let a = base.join("a.txt");
    let b = base.join("b.txt");
    fs::write(&a, b"payload").unwrap();

    let report = run_move(vec![a.clone()], vec![b.clone()], OverwritePolicy::Never);

    assert!(report.is_clean());
    assert!(!a.exists());
    assert_eq!(fs::read(&b).unwrap(), b"payload");
}

#[test]
#[serial]
fn move_collision_under_never_renames_the_destination() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path().canonicalize().unwrap();
    let a = base.join("a.txt");
    let b = base.join("b.txt");
    fs::write(&a, b"incoming").unwrap();
    fs::write(&b, b"already here").unwrap();

    let report = run_move(vec![a.clone()], vec![b.clone()], OverwritePolicy::Never);

    assert!(report.is_clean());
    assert!(!a.exists());
    assert_eq!(fs::read(&b).unwrap(), b"already here");
    assert_eq!(fs::read(base.join("b-1.txt")).unwrap(), b"incoming");
}

#[test]
#[serial]
fn move_collision_under_always_replaces_the_target() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path().canonicalize().unwrap();
    let a = base.join("a.txt");
    let b = base.join("b.txt");
    fs::write(&a, b"incoming").unwrap();
    fs::write(&b, b"doomed").unwrap();

    let report = run_move(vec![a.clone()], vec![b.clone()], OverwritePolicy::Always);

    assert!(report.is_clean());
    assert!(!a.exists());
    assert_eq!(fs::read(&b).unwrap(), b"incoming");
    assert!(!base.join("b-1.txt").exists());
}

#[test]
#[serial]
fn forced_cross_device_move_copies_the_tree_then_deletes_the_source() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path().canonicalize().unwrap();
    let src = base.join("src");
    let layout = ["top.txt", "sub/mid.txt", "sub/deep/leaf.bin"];
    for rel in layout {
        let p = src.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(&p, rel.as_bytes()).unwrap();
    }
    let expected = collect_relative_files(&src);

    unsafe {
        std::env::set_var("FILEHERD_FORCE_CROSS_DEVICE", "1");
    }
    let dst = base.join("dst");
    let report = run_move(vec![src.clone()], vec![dst.clone()], OverwritePolicy::Never);
    unsafe {
        std::env::remove_var("FILEHERD_FORCE_CROSS_DEVICE");
    }

    assert!(report.is_clean(), "unexpected failures: {:?}", report.failed);
    assert_eq!(collect_relative_files(&dst), expected);
    for rel in layout {
        assert_eq!(fs::read(dst.join(rel)).unwrap(), rel.as_bytes());
    }
    assert!(!src.exists(), "source tree must be deleted after the copy");
}

#[cfg(unix)]
#[test]
#[serial]
fn forced_cross_device_partial_failure_leaves_only_the_failing_entry_behind() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path().canonicalize().unwrap();
    let src = base.join("src");
    fs::create_dir_all(src.join("sub")).unwrap();
    fs::write(src.join("ok.txt"), b"fine").unwrap();
    fs::write(src.join("sub/nested.txt"), b"also fine").unwrap();
    // A dangling symlink cannot be copied; its step fails, nothing else does.
    let bad = src.join("bad.txt");
    std::os::unix::fs::symlink(base.join("no-such-target"), &bad).unwrap();

    unsafe {
        std::env::set_var("FILEHERD_FORCE_CROSS_DEVICE", "1");
    }
    let dst = base.join("dst");
    let report = run_move(vec![src.clone()], vec![dst.clone()], OverwritePolicy::Never);
    unsafe {
        std::env::remove_var("FILEHERD_FORCE_CROSS_DEVICE");
    }

    assert_eq!(report.failed, vec![bad.clone()]);
    // Siblings moved; only the failing entry (and the directories above it)
    // remain at the source.
    assert_eq!(fs::read(dst.join("ok.txt")).unwrap(), b"fine");
    assert_eq!(fs::read(dst.join("sub/nested.txt")).unwrap(), b"also fine");
    assert!(!dst.join("bad.txt").exists());
    assert!(bad.symlink_metadata().is_ok(), "failing entry stays at the source");
    assert!(!src.join("ok.txt").exists());
    assert!(!src.join("sub").exists(), "fully-moved subdirs are cleaned up");
}

#[test]
#[serial]
fn cross_device_move_emits_one_progress_event_per_pair() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path().canonicalize().unwrap();
    let src = base.join("src");
    fs::create_dir_all(src.join("sub")).unwrap();
    fs::write(src.join("sub/file.txt"), b"x").unwrap();

    unsafe {
        std::env::set_var("FILEHERD_FORCE_CROSS_DEVICE", "1");
    }
    let request = OperationRequest::new(
        OpKind::Move,
        vec![src],
        vec![base.join("dst")],
        OverwritePolicy::Never,
    )
    .unwrap();
    let stop = StopFlag::new();
    let mut events = Vec::new();
    let report = engine::run(&request, &stop, &mut |p| events.push(p)).unwrap();
    unsafe {
        std::env::remove_var("FILEHERD_FORCE_CROSS_DEVICE");
    }

    assert!(report.is_clean());
    // The subtree copy is internal to the single move step.
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].total, 1);
}
