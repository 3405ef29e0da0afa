//! End-to-end tests of the `quire` binary against temporary vaults

mod common;

use anyhow::Result;
use common::{vault, write_batch};
use std::fs;
use std::time::Duration;

const NOTES_BATCH: &str = r##"[
    {"kind": "upsert_markdown_file", "path": "projects/alpha/todo.md", "content": "# Todo\n"},
    {"kind": "process_markdown_file", "path": "projects/alpha/todo.md", "transform": {"append": "- ship\n"}},
    {"kind": "create_folder", "path": "projects"},
    {"kind": "create_file", "path": "projects/alpha/data.csv", "content": "a,b\n"}
]"##;

#[test]
fn test_apply_json_batch() -> Result<()> {
    let vault = vault()?;
    let batch = write_batch(vault.path(), "batch.json", NOTES_BATCH)?;

    let result = quire!(vault.path(), "apply", batch.to_str().unwrap_or_default()).assert_success()?;
    assert!(result.contains_stdout("Applied 3 action(s) (4 submitted)"));

    let todo = fs::read_to_string(vault.path().join("projects/alpha/todo.md"))?;
    assert_eq!(todo, "# Todo\n- ship\n");
    let data = fs::read_to_string(vault.path().join("projects/alpha/data.csv"))?;
    assert_eq!(data, "a,b\n");
    Ok(())
}

#[test]
fn test_apply_toml_batch_with_vault_flag() -> Result<()> {
    let vault = vault()?;
    let scratch = tempfile::TempDir::new()?;
    fs::create_dir(vault.path().join("inbox"))?;
    fs::write(vault.path().join("inbox/old.md"), "keep me\n")?;
    fs::write(vault.path().join("inbox/stale.md"), "")?;

    let batch = write_batch(
        scratch.path(),
        "batch.toml",
        r#"
[[actions]]
kind = "rename_markdown_file"
from = "inbox/old.md"
to = "archive/old.md"

[[actions]]
kind = "trash_file"
path = "inbox/stale.md"
"#,
    )?;

    let vault_arg = vault.path().to_str().unwrap_or_default();
    let batch_arg = batch.to_str().unwrap_or_default();
    quire!(scratch.path(), "--vault", vault_arg, "apply", batch_arg).assert_success()?;

    assert_eq!(
        fs::read_to_string(vault.path().join("archive/old.md"))?,
        "keep me\n"
    );
    assert!(!vault.path().join("inbox/old.md").exists());
    assert!(!vault.path().join("inbox/stale.md").exists());
    // Default trash mode keeps trashed nodes under .trash/
    assert!(vault.path().join(".trash/stale.md").exists());
    Ok(())
}

#[test]
fn test_dry_run_changes_nothing() -> Result<()> {
    let vault = vault()?;
    let scratch = tempfile::TempDir::new()?;
    let batch = write_batch(scratch.path(), "batch.json", NOTES_BATCH)?;

    let result = quire!(
        vault.path(),
        "apply",
        batch.to_str().unwrap_or_default(),
        "--dry-run"
    )
    .assert_success()?;

    assert!(result.contains_stdout("Execution Plan"));
    assert!(result.contains_stdout("Dry run: nothing was applied"));
    assert_eq!(fs::read_dir(vault.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_plan_orders_parents_first() -> Result<()> {
    let vault = vault()?;
    let batch = write_batch(
        vault.path(),
        "batch.json",
        r#"[
            {"kind": "create_folder", "path": "a/b/c"},
            {"kind": "create_folder", "path": "a/b"},
            {"kind": "create_folder", "path": "a"},
            {"kind": "upsert_markdown_file", "path": "a/b/c/note.md", "content": "x"},
            {"kind": "upsert_markdown_file", "path": "a/b/c/note.md", "content": "y"}
        ]"#,
    )?;

    let result = quire!(vault.path(), "plan", batch.to_str().unwrap_or_default()).assert_success()?;
    assert!(result.contains_stdout("5 action(s) submitted, 4 after collapsing"));

    let steps: Vec<&str> = result
        .stdout
        .lines()
        .filter(|line| line.contains(". "))
        .collect();
    assert_eq!(steps.len(), 4, "{}", result.stdout);
    assert!(steps[..3].iter().all(|line| line.contains("CreateFolder")));
    assert!(!steps[0].contains("a/b"));
    assert!(steps[1].contains("a/b") && !steps[1].contains("a/b/c"));
    assert!(steps[2].contains("a/b/c"));
    assert!(steps[3].contains("a/b/c/note.md"));
    Ok(())
}

#[test]
fn test_partial_failure_exits_nonzero() -> Result<()> {
    let vault = vault()?;
    fs::write(vault.path().join("blocker"), "")?;
    let batch = write_batch(
        vault.path(),
        "batch.json",
        r#"[
            {"kind": "upsert_markdown_file", "path": "blocker/inside.md", "content": "x"},
            {"kind": "upsert_markdown_file", "path": "fine.md", "content": "y"}
        ]"#,
    )?;

    let result = quire!(vault.path(), "apply", batch.to_str().unwrap_or_default()).assert_failure()?;
    assert!(result.contains_stdout("not a folder"));
    assert!(result.contains_stderr("1 of 2 action(s) failed"));
    assert_eq!(fs::read_to_string(vault.path().join("fine.md"))?, "y");
    Ok(())
}

#[test]
fn test_invalid_batch_is_rejected() -> Result<()> {
    let vault = vault()?;
    let batch = write_batch(
        vault.path(),
        "batch.json",
        r#"[{"kind": "upsert_markdown_file", "path": "notes.txt"}]"#,
    )?;

    let result = quire!(vault.path(), "apply", batch.to_str().unwrap_or_default()).assert_failure()?;
    assert!(result.contains_stderr("Action #1"));
    assert!(!vault.path().join("notes.txt").exists());
    Ok(())
}

#[test]
fn test_config_set_get() -> Result<()> {
    let vault = vault()?;

    quire!(vault.path(), "config", "set", "dispatch.self_event_ttl_ms", "250").assert_success()?;
    let result = quire!(vault.path(), "config", "get", "dispatch.self_event_ttl_ms").assert_success()?;
    assert_eq!(result.stdout.trim(), "250");
    assert!(vault.path().join(".quire/config.toml").exists());

    quire!(vault.path(), "config", "set", "store.trash", "delete").assert_success()?;
    let result = quire!(vault.path(), "config", "get", "store.trash").assert_success()?;
    assert_eq!(result.stdout.trim(), "delete");
    Ok(())
}

#[test]
fn test_config_rejects_invalid_values() -> Result<()> {
    let vault = vault()?;

    let result =
        quire!(vault.path(), "config", "set", "dispatch.self_event_ttl_ms", "5").assert_failure()?;
    assert!(result.contains_stderr("self_event_ttl_ms"));
    // Nothing was saved
    assert!(!vault.path().join(".quire/config.toml").exists());

    quire!(vault.path(), "config", "set", "store.trash", "shred").assert_failure()?;
    quire!(vault.path(), "config", "get", "no.such.key").assert_failure()?;
    Ok(())
}

#[test]
fn test_delete_trash_mode_removes_nodes() -> Result<()> {
    let vault = vault()?;
    fs::write(vault.path().join("gone.md"), "bye")?;
    quire!(vault.path(), "config", "set", "store.trash", "delete").assert_success()?;

    let scratch = tempfile::TempDir::new()?;
    let batch = write_batch(
        scratch.path(),
        "batch.json",
        r#"[{"kind": "trash_file", "path": "gone.md"}]"#,
    )?;
    quire!(vault.path(), "apply", batch.to_str().unwrap_or_default()).assert_success()?;

    assert!(!vault.path().join("gone.md").exists());
    assert!(!vault.path().join(".trash").exists());
    Ok(())
}

#[test]
fn test_apply_watch_reports_only_external_changes() -> Result<()> {
    let vault = vault()?;
    let scratch = tempfile::TempDir::new()?;
    let batch = write_batch(scratch.path(), "batch.json", NOTES_BATCH)?;

    let running = quire!(
        vault.path(),
        "apply",
        batch.to_str().unwrap_or_default(),
        "--watch"
    )
    .spawn()?;
    let startup = running.wait_for("Watching", Duration::from_secs(10))?;
    assert!(startup.iter().any(|l| l.contains("Applied 3 action(s)")));

    fs::write(vault.path().join("outside.md"), "hello")?;
    let lines = running.collect(Duration::from_secs(1));

    assert!(lines.iter().any(|l| l.contains("outside.md")), "{:?}", lines);
    assert!(!lines.iter().any(|l| l.contains("projects")), "{:?}", lines);
    Ok(())
}

#[test]
fn test_apply_watch_conflicts_with_dry_run() -> Result<()> {
    let vault = vault()?;
    let batch = write_batch(vault.path(), "batch.json", NOTES_BATCH)?;

    let result = quire!(
        vault.path(),
        "apply",
        batch.to_str().unwrap_or_default(),
        "--watch",
        "--dry-run"
    )
    .assert_failure()?;
    assert!(result.contains_stderr("cannot be used with"));
    assert_eq!(fs::read_dir(vault.path())?.count(), 1);
    Ok(())
}
