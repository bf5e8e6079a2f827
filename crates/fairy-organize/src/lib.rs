//! # fairy-organize
//!
//! Rename-and-move planning for File Fairy.
//!
//! | Stage | Type | |
//! |-------|------|-|
//! | rules | [`RuleTable`] | categories, rename templates, excludes (`rules.toml`) |
//! | scan | [`scan`] / [`ScanReport`] | files under a root, sorted |
//! | plan | [`Planner`] -> [`Plan`] | one [`ChangeEntry`](fairy_core::ChangeEntry) per file that changes |
//! | | [`KeyChunkSelector`] | representative chunks of long documents for AI naming |
//! | apply | [`PlanExecutor`] -> [`ApplyReport`] | sequential renames, one log line each |
//!
//! A plan is computed completely before anything on disk changes. Destinations
//! are unique within a plan: clashes get a numeric suffix (`notes_1.txt`).

pub mod executor;
pub mod key_chunks;
pub mod naming;
pub mod planner;
pub mod rules;
pub mod scan;

pub use executor::{
    append_log, ApplyReport, AutoConfirm, Confirm, Outcome, OutcomeStatus, PlanExecutor, Review,
};
pub use key_chunks::KeyChunkSelector;
pub use planner::{AiOptions, Plan, Planner};
pub use rules::{AiRenameRule, Category, MoveRule, RenameRule, RuleTable, LOG_FILE_NAME, RULES_FILE_NAME};
pub use scan::{scan, ScanReport};
