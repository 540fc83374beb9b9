//! End-to-end scenarios driving the built `pallet` binary.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

/// A scratch installation root plus catalog path, and a helper to invoke
/// the built binary against them.
struct TestContext {
    root: TempDir,
    db: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let root = TempDir::new().expect("failed to create temp root");
        let db = root.path().join("catalog.db");
        Self { root, db }
    }

    fn pallet(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_pallet");
        let mut cmd = Command::new(bin_path);
        cmd.current_dir(self.root.path());
        cmd.arg("--db").arg(&self.db);
        cmd
    }

    fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let dir = self.root.path().join("scripts");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "#!/bin/sh").unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }
}

fn testpkg_script(ctx: &TestContext) -> PathBuf {
    ctx.write_script(
        "testpkg.sh",
        "echo hi > file\nmkdir -p testdir\necho there > testdir/file2\ncat <<'EOF'\nname = \"testpkg\"\nversion = \"0.1\"\nmaintainer = \"Morn\"\ndeps = \"testpkgtwo\"\nEOF\n",
    )
}

fn testpkgtwo_script(ctx: &TestContext) -> PathBuf {
    ctx.write_script(
        "testpkgtwo.sh",
        "echo two > twofile\ncat <<'EOF'\nname = \"testpkgtwo\"\nversion = \"1.0\"\nmaintainer = \"Morn\"\ndeps = \"\"\nEOF\n",
    )
}

#[test]
fn help_and_version_exit_cleanly() {
    let ctx = TestContext::new();
    let output = ctx.pallet().arg("--help").output().expect("failed to run pallet");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage:"));

    let output = ctx.pallet().arg("--version").output().expect("failed to run pallet");
    assert!(output.status.success());
}

#[test]
fn fresh_install_without_no_deps_fails_unmet_dependencies() {
    let ctx = TestContext::new();
    let script = testpkg_script(&ctx);

    let output = ctx
        .pallet()
        .arg("install")
        .arg(&script)
        .output()
        .expect("failed to run pallet");

    assert!(!output.status.success());
    assert!(!ctx.root.path().join("file").exists());
}

#[test]
fn fresh_install_with_no_deps_materializes_files() {
    let ctx = TestContext::new();
    let script = testpkg_script(&ctx);

    let output = ctx
        .pallet()
        .arg("install")
        .arg(&script)
        .arg("--no-deps")
        .output()
        .expect("failed to run pallet");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(ctx.root.path().join("file").exists());
    assert!(ctx.root.path().join("testdir/file2").exists());
    assert_eq!(fs::read_to_string(ctx.root.path().join("file")).unwrap(), "hi\n");
}

#[test]
fn batched_dependency_install_satisfies_itself() {
    let ctx = TestContext::new();
    let script_two = testpkgtwo_script(&ctx);
    let script_one = testpkg_script(&ctx);

    let output = ctx
        .pallet()
        .arg("install")
        .arg(&script_two)
        .arg(&script_one)
        .output()
        .expect("failed to run pallet");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(ctx.root.path().join("file").exists());
    assert!(ctx.root.path().join("twofile").exists());
}

#[test]
fn file_conflict_rolls_back_and_writes_nothing() {
    let ctx = TestContext::new();
    let script_a = ctx.write_script(
        "a.sh",
        "echo a > shared\ncat <<'EOF'\nname = \"a\"\nversion = \"1\"\nmaintainer = \"Morn\"\ndeps = \"\"\nEOF\n",
    );
    let script_b = ctx.write_script(
        "b.sh",
        "echo b > shared\ncat <<'EOF'\nname = \"b\"\nversion = \"1\"\nmaintainer = \"Morn\"\ndeps = \"\"\nEOF\n",
    );

    let output = ctx.pallet().arg("install").arg(&script_a).output().unwrap();
    assert!(output.status.success());

    let output = ctx.pallet().arg("install").arg(&script_b).output().unwrap();
    assert!(!output.status.success());

    assert_eq!(fs::read_to_string(ctx.root.path().join("shared")).unwrap(), "a\n");

    let query = ctx.pallet().arg("query").arg("b").output().unwrap();
    assert!(String::from_utf8_lossy(&query.stdout).contains("no packages matched"));
}

#[test]
fn modified_file_is_retained_without_hard_remove() {
    let ctx = TestContext::new();
    let script = ctx.write_script(
        "a.sh",
        "echo content > f\ncat <<'EOF'\nname = \"a\"\nversion = \"1\"\nmaintainer = \"Morn\"\ndeps = \"\"\nEOF\n",
    );
    let out = ctx.pallet().arg("install").arg(&script).output().unwrap();
    assert!(out.status.success());

    fs::write(ctx.root.path().join("f"), "tampered").unwrap();

    let out = ctx.pallet().arg("remove").arg("a").output().unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    assert!(ctx.root.path().join("f").exists());
    assert_eq!(fs::read_to_string(ctx.root.path().join("f")).unwrap(), "tampered");
}

#[test]
fn modified_file_is_backed_up_with_hard_remove() {
    let ctx = TestContext::new();
    let script = ctx.write_script(
        "a.sh",
        "echo content > f\ncat <<'EOF'\nname = \"a\"\nversion = \"1\"\nmaintainer = \"Morn\"\ndeps = \"\"\nEOF\n",
    );
    let out = ctx.pallet().arg("install").arg(&script).output().unwrap();
    assert!(out.status.success());

    fs::write(ctx.root.path().join("f"), "tampered").unwrap();

    let out = ctx.pallet().arg("remove").arg("a").arg("--hard").output().unwrap();
    assert!(out.status.success());

    assert!(!ctx.root.path().join("f").exists());
}

#[test]
fn removing_an_absent_package_is_fatal() {
    let ctx = TestContext::new();
    let out = ctx.pallet().arg("remove").arg("ghost").output().unwrap();
    assert!(!out.status.success());
}

#[test]
fn query_lists_installed_packages() {
    let ctx = TestContext::new();
    let script = ctx.write_script(
        "a.sh",
        "echo hi > f\ncat <<'EOF'\nname = \"a\"\nversion = \"1.2.0\"\nmaintainer = \"Morn\"\ndeps = \"\"\nEOF\n",
    );
    ctx.pallet().arg("install").arg(&script).output().unwrap();

    let out = ctx.pallet().arg("query").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("a"));
    assert!(stdout.contains("1.2.0"));

    let out = ctx.pallet().arg("query").arg("a").arg("--files").output().unwrap();
    assert!(String::from_utf8_lossy(&out.stdout).contains("f"));
}
