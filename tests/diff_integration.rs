//! Integration tests for the diff engine.
//!
//! These tests build a repository store in a temp directory (bare
//! repositories laid out as `<root>/<owner>/<repo>.git`) and verify
//! single and batched branch diffs against real git history.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use refgate::core::paths::RepoStore;
use refgate::core::types::BranchName;
use refgate::diff::{BranchDiffRequest, DiffEngine};
use refgate::git::{DiffStatus, Git};

/// Test fixture holding a scratch worktree and a bare repository store.
struct TestStore {
    root: TempDir,
    scratch: TempDir,
}

impl TestStore {
    fn new() -> Self {
        Self {
            root: TempDir::new().expect("failed to create store root"),
            scratch: TempDir::new().expect("failed to create scratch dir"),
        }
    }

    fn store(&self) -> RepoStore {
        RepoStore::new(self.root.path())
    }

    fn engine(&self) -> DiffEngine {
        DiffEngine::new(self.store())
    }

    /// Build a worktree with main + feature history, then publish it as
    /// a bare repository under `<owner>/<repo>.git`.
    ///
    /// History: main carries `a.txt`; feature branches from main, edits
    /// `a.txt`, and adds `b.txt`.
    fn seed_repo(&self, owner: &str, repo: &str) -> PathBuf {
        let work = self.scratch.path().join(format!("{owner}-{repo}"));
        std::fs::create_dir(&work).unwrap();

        run_git(&work, &["init", "-b", "main"]);
        run_git(&work, &["config", "user.email", "test@example.com"]);
        run_git(&work, &["config", "user.name", "Test User"]);

        std::fs::write(work.join("a.txt"), "line one\nline two\n").unwrap();
        run_git(&work, &["add", "a.txt"]);
        run_git(&work, &["commit", "-m", "Initial commit"]);

        run_git(&work, &["checkout", "-b", "feature"]);
        std::fs::write(work.join("a.txt"), "line one\nline two changed\n").unwrap();
        std::fs::write(work.join("b.txt"), "brand new\n").unwrap();
        run_git(&work, &["add", "a.txt", "b.txt"]);
        run_git(&work, &["commit", "-m", "Feature work"]);
        run_git(&work, &["checkout", "main"]);

        self.publish(&work, owner, repo)
    }

    /// Clone a worktree into the store as a bare repository.
    fn publish(&self, work: &Path, owner: &str, repo: &str) -> PathBuf {
        let target = self.store().repo_path(owner, repo);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        run_git(
            self.scratch.path(),
            &[
                "clone",
                "--bare",
                work.to_str().unwrap(),
                target.to_str().unwrap(),
            ],
        );
        target
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

// =============================================================================
// Single Diff
// =============================================================================

#[test]
fn diff_reports_feature_changes() {
    let fixture = TestStore::new();
    let path = fixture.seed_repo("alice", "demo");
    let git = Git::open(&path).unwrap();

    let result = fixture
        .engine()
        .diff_branches(&git, "alice", "demo", "main", "feature");

    assert_eq!(result.owner, "alice");
    assert_eq!(result.repo, "demo");
    assert_eq!(result.branch1, "main");
    assert_eq!(result.branch2, "feature");
    assert!(result.error.is_none());

    let diff = result.diff.expect("diff content");
    assert_eq!(diff.files_changed, 2);

    let a = diff.files.iter().find(|f| f.path == "a.txt").unwrap();
    assert_eq!(a.status, DiffStatus::Modified);
    assert_eq!(a.additions, 1);
    assert_eq!(a.deletions, 1);
    assert!(!a.binary);

    let b = diff.files.iter().find(|f| f.path == "b.txt").unwrap();
    assert_eq!(b.status, DiffStatus::Added);
    assert_eq!(b.additions, 1);
    assert_eq!(b.deletions, 0);

    assert_eq!(diff.additions, 2);
    assert_eq!(diff.deletions, 1);
}

#[test]
fn diff_against_deleted_branch_carries_identity_and_error() {
    let fixture = TestStore::new();
    let path = fixture.seed_repo("alice", "demo");
    run_git(&path, &["branch", "-D", "feature"]);
    let git = Git::open(&path).unwrap();

    let result = fixture
        .engine()
        .diff_branches(&git, "alice", "demo", "main", "feature");

    assert_eq!(result.owner, "alice");
    assert_eq!(result.repo, "demo");
    assert!(result.diff.is_none());

    let error = result.error.as_deref().unwrap();
    assert!(error.contains("main"));
    assert!(error.contains("feature"));
    assert!(error.contains("alice/demo"));
}

#[test]
fn diff_of_unrelated_histories_reports_no_merge_base() {
    let fixture = TestStore::new();
    let work = fixture.scratch.path().join("orphaned");
    std::fs::create_dir(&work).unwrap();

    run_git(&work, &["init", "-b", "main"]);
    run_git(&work, &["config", "user.email", "test@example.com"]);
    run_git(&work, &["config", "user.name", "Test User"]);
    std::fs::write(work.join("a.txt"), "main side\n").unwrap();
    run_git(&work, &["add", "a.txt"]);
    run_git(&work, &["commit", "-m", "Main root"]);

    // An orphan branch shares no history with main.
    run_git(&work, &["checkout", "--orphan", "island"]);
    std::fs::write(work.join("z.txt"), "island side\n").unwrap();
    run_git(&work, &["add", "z.txt"]);
    run_git(&work, &["rm", "--cached", "a.txt"]);
    run_git(&work, &["commit", "-m", "Island root"]);

    let path = fixture.publish(&work, "alice", "islands");
    let git = Git::open(&path).unwrap();

    let result = fixture
        .engine()
        .diff_branches(&git, "alice", "islands", "main", "island");

    assert!(result.diff.is_none());
    let error = result.error.as_deref().unwrap();
    assert!(error.contains("no merge base"));
}

#[test]
fn diff_flags_binary_files() {
    let fixture = TestStore::new();
    let work = fixture.scratch.path().join("binrepo");
    std::fs::create_dir(&work).unwrap();

    run_git(&work, &["init", "-b", "main"]);
    run_git(&work, &["config", "user.email", "test@example.com"]);
    run_git(&work, &["config", "user.name", "Test User"]);
    std::fs::write(work.join("readme.txt"), "text\n").unwrap();
    run_git(&work, &["add", "readme.txt"]);
    run_git(&work, &["commit", "-m", "Initial commit"]);

    run_git(&work, &["checkout", "-b", "feature"]);
    std::fs::write(work.join("blob.bin"), [0u8, 159, 146, 150, 0, 1, 2]).unwrap();
    run_git(&work, &["add", "blob.bin"]);
    run_git(&work, &["commit", "-m", "Add binary"]);
    run_git(&work, &["checkout", "main"]);

    let path = fixture.publish(&work, "alice", "binaries");
    let git = Git::open(&path).unwrap();

    let result = fixture
        .engine()
        .diff_branches(&git, "alice", "binaries", "main", "feature");

    let diff = result.diff.expect("diff content");
    let bin = diff.files.iter().find(|f| f.path == "blob.bin").unwrap();
    assert!(bin.binary);
    assert_eq!(bin.additions, 0);
    assert_eq!(bin.deletions, 0);
}

#[test]
fn diff_detects_renames() {
    let fixture = TestStore::new();
    let work = fixture.scratch.path().join("renames");
    std::fs::create_dir(&work).unwrap();

    run_git(&work, &["init", "-b", "main"]);
    run_git(&work, &["config", "user.email", "test@example.com"]);
    run_git(&work, &["config", "user.name", "Test User"]);
    std::fs::write(
        work.join("old_name.txt"),
        "a stable body of text\nthat does not change\nacross the rename\n",
    )
    .unwrap();
    run_git(&work, &["add", "old_name.txt"]);
    run_git(&work, &["commit", "-m", "Initial commit"]);

    run_git(&work, &["checkout", "-b", "feature"]);
    run_git(&work, &["mv", "old_name.txt", "new_name.txt"]);
    run_git(&work, &["commit", "-m", "Rename file"]);
    run_git(&work, &["checkout", "main"]);

    let path = fixture.publish(&work, "alice", "renames");
    let git = Git::open(&path).unwrap();

    let result = fixture
        .engine()
        .diff_branches(&git, "alice", "renames", "main", "feature");

    let diff = result.diff.expect("diff content");
    assert_eq!(diff.files_changed, 1);
    let renamed = &diff.files[0];
    assert_eq!(renamed.status, DiffStatus::Renamed);
    assert_eq!(renamed.path, "new_name.txt");
    assert_eq!(renamed.old_path.as_deref(), Some("old_name.txt"));
}

// =============================================================================
// Batch Diff
// =============================================================================

#[test]
fn batch_isolates_invalid_repository() {
    let fixture = TestStore::new();
    fixture.seed_repo("alice", "demo");
    fixture.seed_repo("bob", "tool");

    let requests = vec![
        BranchDiffRequest {
            owner: "alice".into(),
            repo: "demo".into(),
            branch1: "main".into(),
            branch2: "feature".into(),
        },
        BranchDiffRequest {
            owner: "carol".into(),
            repo: "ghost".into(),
            branch1: "main".into(),
            branch2: "dev".into(),
        },
        BranchDiffRequest {
            owner: "bob".into(),
            repo: "tool".into(),
            branch1: "main".into(),
            branch2: "feature".into(),
        },
    ];

    let results = fixture.engine().diff_branches_batch(&requests);
    assert_eq!(results.len(), 3);

    assert!(results[0].error.is_none());
    assert!(results[0].diff.is_some());
    assert_eq!(results[0].owner, "alice");

    let error = results[1].error.as_deref().unwrap();
    assert!(error.contains("carol/ghost"));
    assert!(results[1].diff.is_none());
    assert_eq!(results[1].owner, "carol");
    assert_eq!(results[1].repo, "ghost");
    assert_eq!(results[1].branch1, "main");
    assert_eq!(results[1].branch2, "dev");

    assert!(results[2].error.is_none());
    assert!(results[2].diff.is_some());
    assert_eq!(results[2].owner, "bob");
}

#[test]
fn batch_preserves_request_order() {
    let fixture = TestStore::new();
    fixture.seed_repo("alice", "demo");

    let requests: Vec<BranchDiffRequest> = (0..4)
        .map(|i| BranchDiffRequest {
            owner: "alice".into(),
            repo: if i % 2 == 0 { "demo" } else { "missing" }.into(),
            branch1: "main".into(),
            branch2: "feature".into(),
        })
        .collect();

    let results = fixture.engine().diff_branches_batch(&requests);
    assert_eq!(results.len(), 4);
    for (result, request) in results.iter().zip(&requests) {
        assert_eq!(result.repo, request.repo);
        assert_eq!(result.error.is_none(), request.repo == "demo");
    }
}

#[test]
fn batch_json_round_trip() {
    let fixture = TestStore::new();
    fixture.seed_repo("alice", "demo");

    let payload = r#"[
        {"owner": "alice", "repo": "demo", "branch1": "main", "branch2": "feature"}
    ]"#;

    let results = fixture.engine().diff_branches_batch_json(payload);
    assert_eq!(results.len(), 1);
    assert!(results[0].error.is_none());
    assert!(results[0].diff.is_some());

    // Results serialize into the wire shape the HTTP layer returns.
    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json[0]["owner"], "alice");
    assert!(json[0].get("error").is_none());
}

#[test]
fn malformed_batch_payload_yields_single_parse_error() {
    let fixture = TestStore::new();

    let results = fixture.engine().diff_branches_batch_json("{\"oops\": true}");
    assert_eq!(results.len(), 1);
    assert!(results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("invalid branch list payload"));
}

// =============================================================================
// Case-insensitive store routing
// =============================================================================

#[test]
fn store_routing_is_case_insensitive() {
    let fixture = TestStore::new();
    fixture.seed_repo("alice", "demo");

    let requests = vec![BranchDiffRequest {
        owner: "Alice".into(),
        repo: "Demo".into(),
        branch1: "main".into(),
        branch2: "feature".into(),
    }];

    let results = fixture.engine().diff_branches_batch(&requests);
    assert!(results[0].error.is_none());
    // The result echoes the request's spelling, not the store's.
    assert_eq!(results[0].owner, "Alice");
}

// =============================================================================
// Backend diff invariants
// =============================================================================

#[test]
fn diff_merge_base_is_main_tip() {
    let fixture = TestStore::new();
    let path = fixture.seed_repo("alice", "demo");
    let git = Git::open(&path).unwrap();

    let main_head = git.branch_head(&BranchName::new("main").unwrap()).unwrap();
    let summary = git
        .diff_branches(
            &BranchName::new("main").unwrap(),
            &BranchName::new("feature").unwrap(),
        )
        .unwrap();

    assert_eq!(summary.merge_base, main_head.id);
}
