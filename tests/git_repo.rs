//! Runs against throwaway git repositories. Skipped when `git` isn't installed.

use std::{fs, path::Path, process::Command};

use ez_changelog::Changelog;
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(dir)
        .args([
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "tag.gpgsign=false",
        ])
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?}: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn commit(dir: &Path, message: &[&str]) {
    let mut args = vec!["commit", "-q", "--allow-empty"];
    for paragraph in message {
        args.push("-m");
        args.push(paragraph);
    }
    git(dir, &args);
}

fn repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "-q"]);
    commit(dir.path(), &["feat(core): add thing", "Closes #4"]);
    commit(dir.path(), &["chore(deps): bump everything"]);
    commit(dir.path(), &["fix(io): flush on drop", "BREAKING CHANGE: io is gone"]);
    dir
}

#[test]
fn commits_from_an_untagged_repo() {
    if !git_available() {
        return;
    }
    let dir = repo();
    let changelog = Changelog::with_dir(dir.path()).unwrap();

    assert_eq!(changelog.previous_tag().unwrap(), None);

    let commits = changelog.get_commits(None).unwrap();
    let subjects = commits.iter().map(|c| c.subject.as_str()).collect::<Vec<_>>();
    assert_eq!(subjects, vec!["flush on drop", "add thing"]);
    assert_eq!(commits[1].closes, vec![4]);
    assert_eq!(commits[0].breaking.as_deref(), Some(" io is gone\n"));
    assert!(commits.iter().all(|c| c.date.is_some()));
    assert_eq!(changelog.last_commit().unwrap(), commits[0].hash);
}

#[test]
fn commits_since_the_previous_tag() {
    if !git_available() {
        return;
    }
    let dir = repo();
    git(dir.path(), &["tag", "v1.0.0"]);
    commit(dir.path(), &["perf(db): add index"]);

    let changelog = Changelog::with_dir(dir.path()).unwrap();

    assert_eq!(changelog.previous_tag().unwrap().as_deref(), Some("v1.0.0"));
    let commits = changelog.get_commits(Some("v1.0.0")).unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].commit_type, "perf");
    assert_eq!(changelog.version_label(Some("v1.0.0")).unwrap(), "v1.0.0");
}

#[test]
fn untagged_label_is_the_short_head_hash() {
    if !git_available() {
        return;
    }
    let dir = repo();
    let changelog = Changelog::with_dir(dir.path()).unwrap();

    let head = changelog.last_commit().unwrap();
    assert_eq!(changelog.version_label(None).unwrap(), head[..8]);
}

#[test]
fn changelog_is_written_into_the_work_tree() {
    if !git_available() {
        return;
    }
    let dir = repo();
    fs::write(dir.path().join("CHANGELOG.md"), "# old\n").unwrap();

    Changelog::with_dir(dir.path())
        .unwrap()
        .version("v2.0.0")
        .write_changelog()
        .unwrap();

    let written = fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
    assert!(written.starts_with("<a name=\"v2.0.0\"></a>\n# v2.0.0 ("));
    assert!(written.contains("\n## Breaking Changes\n\n- **io:** due to "));
    assert!(written.contains("- **core:** add thing\n"));
    assert!(written.contains(",\n   #4)\n"));
    assert!(written.contains("- **io:** flush on drop\n"));
    assert!(!written.contains("bump everything"));
    assert!(written.ends_with("# old\n"));
}

#[test]
fn build_log_skips_commits_before_the_last_build() {
    if !git_available() {
        return;
    }
    let dir = repo();
    fs::write(
        dir.path().join("BUILDLOG.md"),
        "<a name=\"v0.1.0.1\"></a>\n# v0.1.0.1 (2999-01-01 00:00)\n\n",
    )
    .unwrap();

    Changelog::with_dir(dir.path())
        .unwrap()
        .incremental(true)
        .version("v0.1.0.2")
        .write_changelog()
        .unwrap();

    let written = fs::read_to_string(dir.path().join("BUILDLOG.md")).unwrap();
    assert!(written.starts_with("<a name=\"v0.1.0.2\"></a>\n# v0.1.0.2 ("));
    assert!(written.contains("### Nothing important to note\n\n<a name=\"v0.1.0.1\">"));
}

#[test]
fn binary_prints_to_stdout() {
    if !git_available() {
        return;
    }
    let dir = repo();
    let output = Command::new(env!("CARGO_BIN_EXE_ez-changelog"))
        .arg("-C")
        .arg(dir.path())
        .args(["-v", "v3.0.0", "--stdout"])
        .env_remove("BUILD_NUMBER")
        .output()
        .expect("failed to run ez-changelog");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<a name=\"v3.0.0\"></a>"));
    assert!(stdout.contains("## Features"));
    assert!(!dir.path().join("CHANGELOG.md").exists());
}
