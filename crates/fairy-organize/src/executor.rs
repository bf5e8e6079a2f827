//! Plan execution.

use async_trait::async_trait;
use chrono::Local;
use fairy_core::{ChangeEntry, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::naming::is_safe_component;
use crate::planner::Plan;

/// Answer to a single reviewed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Review {
    Apply,
    Skip,
    /// Apply under a different file name, same folder
    Rename(String),
    /// Skip this entry and everything after it
    Quit,
}

/// Asks the user before a plan is applied.
///
/// `confirm` is asked once for the whole plan. In review mode `review` is
/// asked for every entry instead.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, plan: &Plan) -> bool;

    async fn review(&self, _entry: &ChangeEntry, _position: usize, _total: usize) -> Review {
        Review::Apply
    }
}

/// Always says yes (`--yes`).
pub struct AutoConfirm;

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _plan: &Plan) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Dry run, nothing touched
    Planned,
    Moved,
    /// Left alone during review
    Skipped,
    Failed(String),
}

/// Result of one plan entry.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub entry: ChangeEntry,
    pub status: OutcomeStatus,
    /// Local time the entry was handled, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
}

impl Outcome {
    /// The operation log line for this outcome.
    pub fn log_line(&self) -> String {
        let from = self.entry.from.display();
        let to = self.entry.to.display();
        match &self.status {
            OutcomeStatus::Planned => format!("[{}] PLANNED: '{from}' -> '{to}'", self.timestamp),
            OutcomeStatus::Moved => format!("[{}] MOVED: '{from}' -> '{to}'", self.timestamp),
            OutcomeStatus::Skipped => format!("[{}] SKIPPED: '{from}' -> '{to}'", self.timestamp),
            OutcomeStatus::Failed(reason) => format!(
                "[{}] FAILED: '{from}' -> '{to}'. Reason: {reason}",
                self.timestamp
            ),
        }
    }
}

/// What happened when a plan was executed.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub outcomes: Vec<Outcome>,
    /// The user declined; nothing was touched
    pub aborted: bool,
    /// The user quit during review; later entries were skipped
    pub quit: bool,
    pub dry_run: bool,
}

impl ApplyReport {
    pub fn moved(&self) -> usize {
        self.count(|s| *s == OutcomeStatus::Moved)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| *s == OutcomeStatus::Skipped)
    }

    fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.outcomes.iter().map(Outcome::log_line).collect()
    }
}

fn now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Applies plans entry by entry. A failing entry is recorded and the rest of
/// the plan still runs; nothing is rolled back.
pub struct PlanExecutor {
    confirm: Arc<dyn Confirm>,
    review: bool,
}

impl PlanExecutor {
    pub fn new(confirm: Arc<dyn Confirm>) -> Self {
        Self {
            confirm,
            review: false,
        }
    }

    /// Ask about every entry instead of the plan as a whole.
    pub fn with_review(mut self, review: bool) -> Self {
        self.review = review;
        self
    }

    pub async fn execute(
        &self,
        plan: &Plan,
        dry_run: bool,
        require_confirmation: bool,
    ) -> Result<ApplyReport> {
        let mut report = ApplyReport {
            dry_run,
            ..Default::default()
        };

        if dry_run {
            report.outcomes = plan
                .entries
                .iter()
                .map(|entry| Outcome {
                    entry: entry.clone(),
                    status: OutcomeStatus::Planned,
                    timestamp: now(),
                })
                .collect();
            return Ok(report);
        }

        if !self.review
            && require_confirmation
            && !plan.is_empty()
            && !self.confirm.confirm(plan).await
        {
            info!("Plan declined, nothing changed");
            report.aborted = true;
            return Ok(report);
        }

        let total = plan.len();
        for (i, entry) in plan.entries.iter().enumerate() {
            let (entry, status) = if report.quit {
                (entry.clone(), OutcomeStatus::Skipped)
            } else if self.review {
                match self.confirm.review(entry, i + 1, total).await {
                    Review::Apply => (entry.clone(), move_entry(entry).await),
                    Review::Skip => (entry.clone(), OutcomeStatus::Skipped),
                    Review::Quit => {
                        info!("Review stopped, {} entries left alone", total - i);
                        report.quit = true;
                        (entry.clone(), OutcomeStatus::Skipped)
                    }
                    Review::Rename(name) => match renamed(entry, &name) {
                        Some(edited) => {
                            let status = move_entry(&edited).await;
                            (edited, status)
                        }
                        None => {
                            warn!("Invalid file name '{name}', skipping");
                            (entry.clone(), OutcomeStatus::Skipped)
                        }
                    },
                }
            } else {
                (entry.clone(), move_entry(entry).await)
            };

            let outcome = Outcome {
                entry,
                status,
                timestamp: now(),
            };
            match outcome.status {
                OutcomeStatus::Failed(_) => warn!("{}", outcome.log_line()),
                _ => info!("{}", outcome.log_line()),
            }
            report.outcomes.push(outcome);
        }

        info!(
            "Applied plan: {} moved, {} skipped, {} failed",
            report.moved(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }
}

/// `entry` with its destination file name replaced by `name`.
fn renamed(entry: &ChangeEntry, name: &str) -> Option<ChangeEntry> {
    let name = name.trim();
    if !is_safe_component(name) {
        return None;
    }
    let to = match entry.to.parent() {
        Some(parent) => parent.join(name),
        None => name.into(),
    };
    Some(ChangeEntry {
        to,
        ..entry.clone()
    })
}

async fn move_entry(entry: &ChangeEntry) -> OutcomeStatus {
    match apply(entry).await {
        Ok(()) => OutcomeStatus::Moved,
        Err(reason) => OutcomeStatus::Failed(reason),
    }
}

async fn apply(entry: &ChangeEntry) -> std::result::Result<(), String> {
    if let Some(parent) = entry.to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("cannot create {}: {e}", parent.display()))?;
    }
    match tokio::fs::try_exists(&entry.to).await {
        Ok(false) => {}
        Ok(true) => return Err("destination already exists".to_string()),
        Err(e) => return Err(format!("cannot check destination: {e}")),
    }
    tokio::fs::rename(&entry.from, &entry.to)
        .await
        .map_err(|e| e.to_string())
}

/// Append log lines to `path`, creating it if needed.
pub async fn append_log(path: &Path, lines: &[String]) -> Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let mut text = lines.join("\n");
    text.push('\n');
    file.write_all(text.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairy_core::NameSource;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct Decline(AtomicUsize);

    #[async_trait]
    impl Confirm for Decline {
        async fn confirm(&self, _plan: &Plan) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    /// Answers reviews from a fixed script, in order.
    struct Scripted {
        answers: Mutex<Vec<Review>>,
        seen: Mutex<Vec<(usize, usize)>>,
    }

    impl Scripted {
        fn new(answers: Vec<Review>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().rev().collect()),
                seen: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl Confirm for Scripted {
        async fn confirm(&self, _plan: &Plan) -> bool {
            panic!("review mode must not ask for the whole plan");
        }

        async fn review(&self, _entry: &ChangeEntry, position: usize, total: usize) -> Review {
            self.seen.lock().unwrap().push((position, total));
            self.answers.lock().unwrap().pop().unwrap_or(Review::Skip)
        }
    }

    fn entry(from: PathBuf, to: PathBuf) -> ChangeEntry {
        ChangeEntry {
            from,
            to,
            category: "Docs".to_string(),
            name_source: NameSource::Unchanged,
        }
    }

    fn plan_for(root: &Path, pairs: &[(&str, &str)]) -> Plan {
        Plan {
            root: root.to_path_buf(),
            entries: pairs
                .iter()
                .map(|(f, t)| entry(root.join(f), root.join(t)))
                .collect(),
            warnings: vec![],
        }
    }

    fn executor() -> PlanExecutor {
        PlanExecutor::new(Arc::new(AutoConfirm))
    }

    #[tokio::test]
    async fn test_moves_files_and_creates_dirs() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        let plan = plan_for(dir.path(), &[("a.txt", "Docs/deep/a.txt")]);

        let report = executor().execute(&plan, false, false).await.unwrap();

        assert_eq!(report.moved(), 1);
        assert!(!dir.path().join("a.txt").exists());
        assert_eq!(std::fs::read_to_string(dir.path().join("Docs/deep/a.txt")).unwrap(), "a");
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        let plan = plan_for(dir.path(), &[("a.txt", "Docs/a.txt")]);

        let report = executor().execute(&plan, true, true).await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.outcomes[0].status, OutcomeStatus::Planned);
        assert!(dir.path().join("a.txt").exists());
        assert!(!dir.path().join("Docs").exists());
    }

    #[tokio::test]
    async fn test_declining_aborts_without_changes() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        let plan = plan_for(dir.path(), &[("a.txt", "Docs/a.txt")]);
        let decline = Arc::new(Decline(AtomicUsize::new(0)));

        let report = PlanExecutor::new(decline.clone())
            .execute(&plan, false, true)
            .await
            .unwrap();

        assert!(report.aborted);
        assert!(report.outcomes.is_empty());
        assert_eq!(decline.0.load(Ordering::SeqCst), 1);
        assert!(dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_batch() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("c.txt"), "c").unwrap();
        std::fs::create_dir(dir.path().join("Docs")).unwrap();
        std::fs::write(dir.path().join("Docs/taken.txt"), "x").unwrap();

        let plan = plan_for(
            dir.path(),
            &[
                ("a.txt", "Docs/a.txt"),
                ("missing.txt", "Docs/missing.txt"),
                ("c.txt", "Docs/taken.txt"),
            ],
        );

        let report = executor().execute(&plan, false, false).await.unwrap();

        assert_eq!(report.moved(), 1);
        assert_eq!(report.failed(), 2);
        assert!(dir.path().join("Docs/a.txt").exists());
        assert!(dir.path().join("c.txt").exists());
        assert_eq!(std::fs::read_to_string(dir.path().join("Docs/taken.txt")).unwrap(), "x");
        assert_eq!(
            report.outcomes[2].status,
            OutcomeStatus::Failed("destination already exists".to_string())
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_only_destination_fails_alone() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        let locked = dir.path().join("Locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();
        if std::fs::write(locked.join(".write_check"), "").is_ok() {
            // permissions are not enforced (running as root)
            return;
        }

        let plan = plan_for(
            dir.path(),
            &[
                ("a.txt", "Docs/a.txt"),
                ("b.txt", "Locked/b.txt"),
                ("c.txt", "Docs/c.txt"),
            ],
        );
        let report = executor().execute(&plan, false, false).await.unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(report.moved(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.outcomes[1].status, OutcomeStatus::Failed(_)));
        assert!(dir.path().join("b.txt").exists());
        assert!(dir.path().join("Docs/a.txt").exists());
        assert!(dir.path().join("Docs/c.txt").exists());
        assert!(report.log_lines()[1].contains("FAILED:"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_destination_is_a_failure() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        let locked = dir.path().join("Locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let plan = plan_for(dir.path(), &[("a.txt", "Locked/a.txt")]);
        let report = executor().execute(&plan, false, false).await.unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        match &report.outcomes[0].status {
            OutcomeStatus::Failed(reason) => {
                assert!(reason.starts_with("cannot check destination"), "{reason}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_review_apply_skip_rename() {
        let dir = tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        let plan = plan_for(
            dir.path(),
            &[
                ("a.txt", "Docs/a.txt"),
                ("b.txt", "Docs/b.txt"),
                ("c.txt", "Docs/c.txt"),
            ],
        );
        let reviewer = Arc::new(Scripted::new(vec![
            Review::Apply,
            Review::Skip,
            Review::Rename("renamed.txt".to_string()),
        ]));

        let report = PlanExecutor::new(reviewer.clone())
            .with_review(true)
            .execute(&plan, false, true)
            .await
            .unwrap();

        assert_eq!(*reviewer.seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(report.moved(), 2);
        assert_eq!(report.skipped(), 1);
        assert!(!report.quit);
        assert!(dir.path().join("Docs/a.txt").exists());
        assert!(dir.path().join("b.txt").exists());
        assert!(dir.path().join("Docs/renamed.txt").exists());
        assert_eq!(report.outcomes[2].entry.to, dir.path().join("Docs/renamed.txt"));
        assert!(report.log_lines()[1].contains("SKIPPED:"));
    }

    #[tokio::test]
    async fn test_review_quit_leaves_the_rest() {
        let dir = tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        let plan = plan_for(
            dir.path(),
            &[
                ("a.txt", "Docs/a.txt"),
                ("b.txt", "Docs/b.txt"),
                ("c.txt", "Docs/c.txt"),
            ],
        );
        let reviewer = Arc::new(Scripted::new(vec![Review::Apply, Review::Quit]));

        let report = PlanExecutor::new(reviewer.clone())
            .with_review(true)
            .execute(&plan, false, true)
            .await
            .unwrap();

        assert!(report.quit);
        assert_eq!(reviewer.seen.lock().unwrap().len(), 2);
        assert_eq!(report.moved(), 1);
        assert_eq!(report.skipped(), 2);
        assert!(dir.path().join("b.txt").exists());
        assert!(dir.path().join("c.txt").exists());
    }

    #[tokio::test]
    async fn test_review_rejects_unsafe_name() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        let plan = plan_for(dir.path(), &[("a.txt", "Docs/a.txt")]);
        let reviewer = Arc::new(Scripted::new(vec![Review::Rename("../escape.txt".to_string())]));

        let report = PlanExecutor::new(reviewer)
            .with_review(true)
            .execute(&plan, false, false)
            .await
            .unwrap();

        assert_eq!(report.skipped(), 1);
        assert!(dir.path().join("a.txt").exists());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_log_line_format() {
        let outcome = Outcome {
            entry: entry(PathBuf::from("/r/a.txt"), PathBuf::from("/r/Docs/a.txt")),
            status: OutcomeStatus::Moved,
            timestamp: "2024-05-01 10:00:00".to_string(),
        };
        assert_eq!(
            outcome.log_line(),
            "[2024-05-01 10:00:00] MOVED: '/r/a.txt' -> '/r/Docs/a.txt'"
        );

        let failed = Outcome {
            status: OutcomeStatus::Failed("denied".to_string()),
            ..outcome
        };
        assert_eq!(
            failed.log_line(),
            "[2024-05-01 10:00:00] FAILED: '/r/a.txt' -> '/r/Docs/a.txt'. Reason: denied"
        );
    }

    #[tokio::test]
    async fn test_append_log() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("fairy.log");

        append_log(&log, &["one".to_string()]).await.unwrap();
        append_log(&log, &["two".to_string(), "three".to_string()]).await.unwrap();
        append_log(&log, &[]).await.unwrap();

        assert_eq!(std::fs::read_to_string(&log).unwrap(), "one\ntwo\nthree\n");
    }
}
