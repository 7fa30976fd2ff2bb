use rusqlite::{params, Connection};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;
use totalrecall_core::db::schema::WINDOW_CAPTURE_FIXTURE_SQL;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    users_root: PathBuf,
    output: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");
        let users_root = base.join("Users");
        let output = base.join("out");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
            users_root,
            output,
        }
    }

    fn base_path(&self, user: &str) -> PathBuf {
        self.users_root
            .join(user)
            .join("AppData/Local/CoreAIPlatform.00/UKP")
    }

    /// Write a config file pointing `users_root` at the fixture profiles.
    fn write_config(&self) {
        let dir = self.xdg_config.join("totalrecall");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(
            dir.join("config.toml"),
            format!(
                "[source]\nusers_root = '{}'\ngrant_permissions = false\n",
                self.users_root.display()
            ),
        )
        .expect("failed to write config");
    }

    fn extraction_folders(&self) -> Vec<PathBuf> {
        match fs::read_dir(&self.output) {
            Ok(entries) => entries.map(|e| e.expect("bad entry").path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn seed_store(base_path: &Path) {
    let folder = base_path.join("{0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0}");
    let images = folder.join("ImageStore");
    fs::create_dir_all(&images).expect("failed to create image store");
    fs::write(images.join("c0ffee"), b"jpeg").expect("failed to write image");

    let conn = Connection::open(folder.join("ukg.db")).expect("failed to create db");
    conn.execute_batch(WINDOW_CAPTURE_FIXTURE_SQL)
        .expect("failed to create schema");
    conn.execute(
        "INSERT INTO WindowCapture (WindowTitle, TimeStamp, ImageToken) VALUES (?1, ?2, ?3)",
        params!["Notepad", 1_700_000_000_000_i64, "c0ffee"],
    )
    .expect("failed to insert row");
}

fn run_bin(env: &CliTestEnv, args: &[&str], stdin: &str) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("totalrecall"));

    let mut child = Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("failed to execute totalrecall: {e}"));

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");

    child
        .wait_with_output()
        .expect("failed to wait for totalrecall")
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "totalrecall {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn extraction_with_explicit_base_path_writes_report() {
    let env = CliTestEnv::new();
    let base = env.base_path("alice");
    seed_store(&base);

    let base_arg = base.display().to_string();
    let output_arg = env.output.display().to_string();
    let args = [
        "--base-path",
        base_arg.as_str(),
        "--output",
        output_arg.as_str(),
        "--yes",
        "--skip-permissions",
    ];
    let output = run_bin(&env, &args, "");
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Recall folder found:"), "stdout:\n{stdout}");
    assert!(stdout.contains("Summary of the extraction is available in the file:"));

    let folders = env.extraction_folders();
    assert_eq!(folders.len(), 1, "expected one extraction folder");
    let folder = &folders[0];
    assert!(folder.join("ukg.db").exists());
    assert!(folder.join("ImageStore/c0ffee.jpg").exists());
    assert_eq!(
        fs::read_to_string(folder.join("TotalRecall.txt")).expect("report should exist"),
        "Captured Windows:\n[2023-11-14 22:13:20] Notepad\n\nImages Taken:\n[2023-11-14 22:13:20] c0ffee\n"
    );
}

#[test]
fn prompted_username_and_confirmation() {
    let env = CliTestEnv::new();
    env.write_config();
    seed_store(&env.base_path("bob"));

    let output_arg = env.output.display().to_string();
    let args = ["--output", output_arg.as_str()];
    let output = run_bin(&env, &args, "bob\nyes\n");
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Input username:"));
    assert!(stdout.contains("Do you want to proceed with the extraction?"));
    assert_eq!(env.extraction_folders().len(), 1);
}

#[test]
fn declining_confirmation_exits_cleanly_without_output() {
    let env = CliTestEnv::new();
    env.write_config();
    seed_store(&env.base_path("carol"));

    let output_arg = env.output.display().to_string();
    let args = ["--username", "carol", "--output", output_arg.as_str()];
    let output = run_bin(&env, &args, "no\n");

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Extraction aborted"), "stderr:\n{stderr}");
    assert!(env.extraction_folders().is_empty());
}

#[test]
fn missing_base_path_exits_with_not_found_code() {
    let env = CliTestEnv::new();
    let base_arg = env.base_path("nobody").display().to_string();
    let output_arg = env.output.display().to_string();
    let args = [
        "--base-path",
        base_arg.as_str(),
        "--output",
        output_arg.as_str(),
        "--yes",
    ];

    let output = run_bin(&env, &args, "");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("resolve location failed"), "stderr:\n{stderr}");
}

#[test]
fn missing_image_store_exits_with_missing_artifact_code() {
    let env = CliTestEnv::new();
    let base = env.base_path("dave");
    seed_store(&base);
    let guid_folder = fs::read_dir(&base)
        .expect("base should exist")
        .next()
        .expect("guid folder")
        .expect("bad entry")
        .path();
    fs::remove_dir_all(guid_folder.join("ImageStore")).expect("failed to remove image store");

    let base_arg = base.display().to_string();
    let output_arg = env.output.display().to_string();
    let args = [
        "--base-path",
        base_arg.as_str(),
        "--output",
        output_arg.as_str(),
        "--yes",
    ];
    let output = run_bin(&env, &args, "");

    assert_eq!(output.status.code(), Some(3));
    assert!(env.extraction_folders().is_empty());
}

#[test]
fn json_summary_is_machine_readable() {
    let env = CliTestEnv::new();
    let base = env.base_path("erin");
    seed_store(&base);

    let base_arg = base.display().to_string();
    let output_arg = env.output.display().to_string();
    let args = [
        "--base-path",
        base_arg.as_str(),
        "--output",
        output_arg.as_str(),
        "--yes",
        "--format",
        "json",
    ];
    let output = run_bin(&env, &args, "");
    assert_success(&args, &output);

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(summary["window_events"], 1);
    assert_eq!(summary["image_events"], 1);
    assert_eq!(summary["normalized"]["renamed"], 1);
    assert!(summary["target"]["report_path"]
        .as_str()
        .expect("report path")
        .ends_with("TotalRecall.txt"));
}
