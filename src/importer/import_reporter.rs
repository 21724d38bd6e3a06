// ==========================================
// 学校管理后台 - 导入汇总器实现
// ==========================================
// 职责: 逐行结果 + 写入结果 → ImportReport
// 口径: 文案按行号顺序排列
// ==========================================

use crate::domain::roster::{CommitResult, ImportReport, ImportStatus, RowOutcome};
use crate::importer::roster_importer_trait::ImportReporter;

pub struct ImportReporterImpl;

impl ImportReporter for ImportReporterImpl {
    fn summarize(&self, outcomes: &[RowOutcome], commit_result: &CommitResult) -> ImportReport {
        let mut ordered: Vec<&RowOutcome> = outcomes.iter().collect();
        ordered.sort_by_key(|outcome| outcome.row_number());

        let mut accepted = 0;
        let mut duplicates = Vec::new();
        let mut format_errors = Vec::new();

        for outcome in ordered {
            match outcome {
                RowOutcome::Accepted(_) => accepted += 1,
                RowOutcome::FormatError { row_number, message } => {
                    format_errors.push(format!("Row {}: {}", row_number, message));
                }
                RowOutcome::DuplicateError {
                    identity_key, name, ..
                } => {
                    duplicates.push(format!("{} ({})", name, identity_key));
                }
            }
        }

        let (successful, uncommitted, status) = match commit_result {
            CommitResult::Committed { inserted } => (
                accepted,
                0,
                ImportStatus::Committed {
                    inserted: *inserted,
                },
            ),
            CommitResult::NoOp => (0, 0, ImportStatus::NoValidRows),
            CommitResult::Failed { reason } => (
                0,
                accepted,
                ImportStatus::CommitFailed {
                    reason: reason.clone(),
                },
            ),
        };

        ImportReport {
            total_processed: outcomes.len(),
            successful,
            uncommitted,
            duplicates,
            format_errors,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roster::Candidate;
    use crate::domain::types::ConflictSource;
    use std::collections::BTreeMap;

    fn candidate(row_number: usize, name: &str, user_id: &str) -> Candidate {
        Candidate {
            row_number,
            name: name.to_string(),
            identity_key: user_id.to_string(),
            fields: BTreeMap::new(),
        }
    }

    fn sample_outcomes() -> Vec<RowOutcome> {
        vec![
            RowOutcome::duplicate_of(&candidate(4, "Alice Smith", "a.smith"), ConflictSource::Existing),
            RowOutcome::Accepted(candidate(2, "Bob Jones", "b.jones")),
            RowOutcome::FormatError {
                row_number: 3,
                message: "Missing required field(s).".to_string(),
            },
        ]
    }

    #[test]
    fn test_committed_report() {
        let report = ImportReporterImpl.summarize(&sample_outcomes(), &CommitResult::Committed { inserted: 1 });

        assert_eq!(report.total_processed, 3);
        assert_eq!(report.successful, 1);
        assert_eq!(report.uncommitted, 0);
        assert_eq!(report.format_errors, vec!["Row 3: Missing required field(s)."]);
        assert_eq!(report.duplicates, vec!["Alice Smith (a.smith)"]);
        assert!(report.is_committed());
        assert!(report.is_consistent());
    }

    #[test]
    fn test_messages_follow_row_order() {
        let outcomes = vec![
            RowOutcome::FormatError {
                row_number: 9,
                message: "late".to_string(),
            },
            RowOutcome::FormatError {
                row_number: 5,
                message: "early".to_string(),
            },
        ];

        let report = ImportReporterImpl.summarize(&outcomes, &CommitResult::NoOp);

        assert_eq!(report.format_errors, vec!["Row 5: early", "Row 9: late"]);
        assert_eq!(report.status, ImportStatus::NoValidRows);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_failed_commit_moves_accepted_to_uncommitted() {
        let report = ImportReporterImpl.summarize(
            &sample_outcomes(),
            &CommitResult::Failed {
                reason: "database is locked".to_string(),
            },
        );

        assert_eq!(report.successful, 0);
        assert_eq!(report.uncommitted, 1);
        assert!(report.is_consistent());
        assert_eq!(report.fatal_error().as_deref(), Some("Import failed: database is locked"));
    }

    #[test]
    fn test_empty_file_report() {
        let report = ImportReporterImpl.summarize(&[], &CommitResult::NoOp);

        assert_eq!(report.total_processed, 0);
        assert_eq!(report.fatal_error().as_deref(), Some("No valid rows found to import"));
    }
}
