//! End-to-end scenarios exercising the Manager against real git
//! repositories (spec §8 scenario seeds S1-S6).

mod common;

use std::time::Duration;

use aleutian_transact::config::{ManagerConfig, PreflightConfig, StrategyKind};
use aleutian_transact::{AdmissionCode, Manager, ManagerError, Status, Transaction};
use common::TestRepo;

fn config_for(repo: &TestRepo, strategy: StrategyKind) -> ManagerConfig {
    let mut config = ManagerConfig::new(repo.root_path().to_path_buf());
    config.strategy = strategy;
    config
}

fn assert_active(tx: &Transaction, strategy: StrategyKind) {
    assert_eq!(tx.status, Status::Active);
    assert_eq!(tx.strategy, strategy);
}

#[test]
fn s1_branch_strategy_happy_path() {
    let repo = TestRepo::new();
    let manager = Manager::new(config_for(&repo, StrategyKind::Branch)).unwrap();

    let tx = manager.begin("s").unwrap();
    assert_active(&tx, StrategyKind::Branch);

    repo.write_file("README", "# b");
    manager.record_modification("README").unwrap();

    let result = manager.commit("edit");
    assert!(result.is_ok(), "commit should succeed: {result:?}");

    assert_eq!(repo.read_file("README"), "# b");
    assert_ne!(result.unwrap(), tx.checkpoint_ref);

    let work_branch = format!("agent-work-{}", &tx.id[..8]);
    let branches = repo.git_output(&["branch", "--list", &work_branch]);
    assert!(branches.is_empty(), "work branch should be deleted after commit");

    assert!(!manager.is_active());
    let state_dir = repo.root_path().join(".aleutian").join("transactions");
    let remaining: Vec<_> = std::fs::read_dir(&state_dir)
        .map(|entries| entries.filter_map(Result::ok).collect())
        .unwrap_or_default();
    assert!(remaining.is_empty(), "journal should be empty after commit");
}

#[test]
fn s2_branch_strategy_preserves_user_wip() {
    let repo = TestRepo::new();
    repo.write_file("README", "# a-wip");

    let mut config = config_for(&repo, StrategyKind::Branch);
    config.preflight = PreflightConfig {
        auto_stash: true,
        ..Default::default()
    };
    let manager = Manager::new(config).unwrap();

    manager.begin("s").unwrap();
    repo.write_file("README", "# b");

    manager.rollback("test").unwrap();

    assert_eq!(repo.read_file("README"), "# a-wip");
    let leftovers: Vec<_> = repo
        .stash_messages()
        .into_iter()
        .filter(|m| m.starts_with("aleutian-"))
        .collect();
    assert!(leftovers.is_empty(), "no aleutian-prefixed stash should remain: {leftovers:?}");
}

#[test]
fn s3_sub_workspace_strategy() {
    let repo = TestRepo::new();
    let manager =
        Manager::new(config_for(&repo, StrategyKind::SubWorkspace)).unwrap();

    let tx = manager.begin("s").unwrap();
    let sub_dir = repo
        .root_path()
        .join(".aleutian")
        .join("subworkspaces")
        .join(&tx.id);
    assert!(sub_dir.is_dir(), "sub-workspace directory should exist");
    assert!(sub_dir.join("README").exists());

    std::fs::write(sub_dir.join("README"), "# b").unwrap();
    manager.record_modification("README").unwrap();
    manager.commit("edit").unwrap();

    assert_eq!(repo.read_file("README"), "# b");
    assert!(!sub_dir.exists(), "sub-workspace should be torn down after commit");
}

#[test]
fn s4_crash_recovery() {
    let repo = TestRepo::new();
    let config = config_for(&repo, StrategyKind::Branch);

    {
        let manager = Manager::new(config.clone()).unwrap();
        manager.begin("s").unwrap();
        repo.write_file("README", "# crashed-write");
        // Process "exits" here: no commit, no rollback, no close().
    }

    let recovered = Manager::new(config).unwrap();
    assert_eq!(repo.read_file("README"), "# a");
    assert!(!recovered.is_active());

    let state_dir = repo.root_path().join(".aleutian").join("transactions");
    let remaining: Vec<_> = std::fs::read_dir(&state_dir)
        .map(|entries| entries.filter_map(Result::ok).collect())
        .unwrap_or_default();
    assert!(remaining.is_empty(), "stale journal record should be swept");
}

#[test]
fn s5_admission_gating_on_rebase_marker() {
    let repo = TestRepo::new();
    std::fs::create_dir_all(repo.git_dir_marker_path("rebase-merge")).unwrap();

    let manager = Manager::new(config_for(&repo, StrategyKind::Branch)).unwrap();
    let err = manager.begin("s").unwrap_err();

    match err {
        ManagerError::AdmissionRefused(report) => {
            assert!(report
                .errors
                .iter()
                .any(|e| e.code == AdmissionCode::RebaseInProgress));
        }
        other => panic!("expected AdmissionRefused, got {other:?}"),
    }

    let state_dir = repo.root_path().join(".aleutian").join("transactions");
    let remaining: Vec<_> = std::fs::read_dir(&state_dir)
        .map(|entries| entries.filter_map(Result::ok).collect())
        .unwrap_or_default();
    assert!(remaining.is_empty(), "no journal file should be written on refusal");
}

#[test]
fn s6_expiration_converts_commit_to_rollback() {
    let repo = TestRepo::new();
    let mut config = config_for(&repo, StrategyKind::Branch);
    config.transaction_ttl = Duration::from_millis(10);
    let manager = Manager::new(config).unwrap();

    manager.begin("s").unwrap();
    repo.write_file("README", "# expired-write");
    std::thread::sleep(Duration::from_millis(50));

    let err = manager.commit("edit").unwrap_err();
    assert!(matches!(err, ManagerError::TransactionExpired));
    assert!(!manager.is_active());
    assert_eq!(repo.read_file("README"), "# a");

    let state_dir = repo.root_path().join(".aleutian").join("transactions");
    let remaining: Vec<_> = std::fs::read_dir(&state_dir)
        .map(|entries| entries.filter_map(Result::ok).collect())
        .unwrap_or_default();
    assert!(remaining.is_empty(), "journal should be empty after expired rollback");
}
