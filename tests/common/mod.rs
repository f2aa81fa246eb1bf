// Helper methods are used unevenly across integration test files.
#![allow(dead_code)]

//! Test harness: an isolated git repository in a temp directory, with
//! deterministic environment variables so commands are reproducible
//! across machines and CI.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

#[cfg(not(windows))]
const NULL_DEVICE: &str = "/dev/null";
#[cfg(windows)]
const NULL_DEVICE: &str = "NUL";

pub const TEST_EPOCH: u64 = 1_735_776_000;

/// Installs both the `log` and `tracing` backends once per process, so
/// integration tests can see the Manager's best-effort `log::warn!`
/// calls and its `tracing` spans/events with `--nocapture`. Safe to call
/// from every test: both initializers are idempotent no-ops after the
/// first successful call.
pub fn init_test_observability() {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn check_git_status(output: &std::process::Output, cmd_desc: &str) {
    if !output.status.success() {
        panic!(
            "git {} failed:\nstdout: {}\nstderr: {}",
            cmd_desc,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// An isolated git repository for integration tests. Cleaned up on drop
/// via the owned [`TempDir`].
pub struct TestRepo {
    _temp_dir: TempDir,
    root: PathBuf,
    git_config_path: PathBuf,
}

impl TestRepo {
    /// A repo initialized on `main` with one commit: `README` = `# a`.
    pub fn new() -> Self {
        let repo = Self::empty();
        repo.write_file("README", "# a");
        repo.run_git(&["add", "."]);
        repo.commit("initial commit");
        repo
    }

    /// An uninitialized-but-`git init`-ed repo with no commits.
    pub fn empty() -> Self {
        init_test_observability();
        let temp_dir = TempDir::new().expect("create temp dir");
        let root = temp_dir.path().join("repo");
        std::fs::create_dir(&root).expect("create repo dir");
        let root = dunce::canonicalize(&root).expect("canonicalize repo root");

        let git_config_path = temp_dir.path().join("test-gitconfig");
        std::fs::write(
            &git_config_path,
            "[user]\n\tname = Test User\n\temail = test@example.com\n\
             [advice]\n\tdetachedHead = false\n\
             [init]\n\tdefaultBranch = main\n",
        )
        .expect("write git config");

        let repo = Self {
            _temp_dir: temp_dir,
            root,
            git_config_path,
        };
        repo.run_git(&["init", "-q"]);
        // Written to .git/config (not just the GIT_CONFIG_GLOBAL override
        // above) so that subprocesses the Manager spawns directly — which
        // don't go through `git_command()` and so don't inherit this
        // test's environment — still resolve an identity and never
        // prompt for detached-HEAD advice.
        repo.run_git(&["config", "user.name", "Test User"]);
        repo.run_git(&["config", "user.email", "test@example.com"]);
        repo.run_git(&["config", "advice.detachedHead", "false"]);
        repo
    }

    fn configure_git_cmd(&self, cmd: &mut Command) {
        cmd.env("GIT_CONFIG_GLOBAL", &self.git_config_path);
        cmd.env("GIT_CONFIG_SYSTEM", NULL_DEVICE);
        cmd.env("GIT_AUTHOR_DATE", "2025-01-01T00:00:00Z");
        cmd.env("GIT_COMMITTER_DATE", "2025-01-01T00:00:00Z");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.env("SOURCE_DATE_EPOCH", TEST_EPOCH.to_string());
        cmd.env("LC_ALL", "C");
        cmd.env("LANG", "C");
    }

    #[must_use]
    pub fn git_command(&self) -> Command {
        let mut cmd = Command::new("git");
        self.configure_git_cmd(&mut cmd);
        cmd.current_dir(&self.root);
        cmd
    }

    pub fn run_git(&self, args: &[&str]) {
        let output = self.git_command().args(args).output().expect("spawn git");
        check_git_status(&output, &args.join(" "));
    }

    pub fn git_output(&self, args: &[&str]) -> String {
        let output = self.git_command().args(args).output().expect("spawn git");
        check_git_status(&output, &args.join(" "));
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    pub fn commit(&self, message: &str) {
        self.run_git(&["commit", "--message", message, "--allow-empty"]);
    }

    pub fn head_sha(&self) -> String {
        self.git_output(&["rev-parse", "HEAD"])
    }

    pub fn current_branch(&self) -> String {
        self.git_output(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub fn is_clean(&self) -> bool {
        self.git_output(&["status", "--porcelain"]).is_empty()
    }

    pub fn write_file(&self, relative_path: &str, contents: &str) {
        let path = self.root.join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, contents).expect("write file");
    }

    pub fn read_file(&self, relative_path: &str) -> String {
        std::fs::read_to_string(self.root.join(relative_path)).expect("read file")
    }

    pub fn file_exists(&self, relative_path: &str) -> bool {
        self.root.join(relative_path).exists()
    }

    pub fn stash_messages(&self) -> Vec<String> {
        self.git_output(&["stash", "list", "--format=%gs"])
            .lines()
            .map(|line| {
                line.split_once(": ")
                    .map(|(_, m)| m.to_string())
                    .unwrap_or_else(|| line.to_string())
            })
            .collect()
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    pub fn git_dir_marker_path(&self, marker: &str) -> PathBuf {
        self.root.join(".git").join(marker)
    }
}
