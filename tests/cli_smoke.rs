use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Binary invocation with config lookup pinned to a missing file so user
/// machines' real config (and template creation) stay out of the picture.
fn run_fileherd(confine_to: &Path, args: &[&str]) -> Output {
    let me = assert_cmd::cargo::cargo_bin!("fileherd");
    Command::new(me)
        .env("FILEHERD_CONFIG", confine_to.join("no-config.xml"))
        .args(args)
        .output()
        .expect("spawn binary")
}

#[test]
fn print_config_succeeds() {
    let td = tempfile::tempdir().unwrap();
    let out = run_fileherd(td.path(), &["--print-config"]);
    assert!(out.status.success(), "--print-config should succeed");
}

#[test]
fn rm_removes_a_file() {
    let td = tempfile::tempdir().unwrap();
    let f = td.path().join("doomed.txt");
    fs::write(&f, b"x").unwrap();

    let out = run_fileherd(td.path(), &["rm", f.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(!f.exists());
}

#[test]
fn cp_copies_into_a_directory() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("note.txt");
    fs::write(&src, b"hello").unwrap();
    let dest = td.path().join("backup");
    fs::create_dir(&dest).unwrap();

    let out = run_fileherd(td.path(), &["cp", src.to_str().unwrap(), dest.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Copying"), "stdout: {stdout}");

    assert_eq!(fs::read(dest.join("note.txt")).unwrap(), b"hello");
    assert!(src.exists());
}

#[test]
fn mv_renames_a_file() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("old-name.txt");
    fs::write(&src, b"payload").unwrap();
    let dst = td.path().join("new-name.txt");

    let out = run_fileherd(td.path(), &["mv", src.to_str().unwrap(), dst.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(!src.exists());
    assert_eq!(fs::read(&dst).unwrap(), b"payload");
}

#[test]
fn mv_into_own_subtree_fails_with_a_structural_error() {
    let td = tempfile::tempdir().unwrap();
    let dir = td.path().join("dir");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("keep.txt"), b"x").unwrap();
    let inside = dir.join("sub");

    let out = run_fileherd(td.path(), &["mv", dir.to_str().unwrap(), inside.to_str().unwrap()]);
    assert!(!out.status.success(), "moving into own subtree must fail");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Invalid move"), "stderr: {stderr}");
    assert!(dir.join("keep.txt").exists(), "nothing may be mutated");
}

#[test]
fn cp_collision_with_never_keeps_both() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("a.txt");
    let taken = td.path().join("b.txt");
    fs::write(&src, b"fresh").unwrap();
    fs::write(&taken, b"old").unwrap();

    let out = run_fileherd(
        td.path(),
        &[
            "cp",
            "--overwrite",
            "never",
            src.to_str().unwrap(),
            taken.to_str().unwrap(),
        ],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(fs::read(&taken).unwrap(), b"old");
    assert_eq!(fs::read(td.path().join("b-1.txt")).unwrap(), b"fresh");
}

#[test]
fn missing_command_is_an_error() {
    let td = tempfile::tempdir().unwrap();
    let out = run_fileherd(td.path(), &[]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no command given"), "stderr: {stderr}");
}
