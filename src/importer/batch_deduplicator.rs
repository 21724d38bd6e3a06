// ==========================================
// 学校管理后台 - 批次去重器实现
// ==========================================
// 职责: 检测与已有花名册重复 + 同批次内重复的身份键
// 策略: 按文件顺序先出现者保留；比较口径忽略大小写
// ==========================================

use crate::domain::roster::{fold_identity_key, Candidate, RowOutcome};
use crate::domain::types::ConflictSource;
use crate::importer::roster_importer_trait::{BatchDeduplicator, DedupPartition};
use std::collections::HashSet;

pub struct BatchDeduplicatorImpl;

impl BatchDeduplicator for BatchDeduplicatorImpl {
    fn dedup(&self, candidates: Vec<Candidate>, existing_roster: &HashSet<String>) -> DedupPartition {
        let existing: HashSet<String> = existing_roster
            .iter()
            .map(|key| fold_identity_key(key))
            .collect();
        let mut seen_in_batch: HashSet<String> = HashSet::new();
        let mut partition = DedupPartition::default();

        for candidate in candidates {
            let key = candidate.folded_key();

            if existing.contains(&key) {
                partition
                    .duplicates
                    .push(RowOutcome::duplicate_of(&candidate, ConflictSource::Existing));
            } else if !seen_in_batch.insert(key) {
                // 同批次已出现：首次出现者已进入 accepted
                partition
                    .duplicates
                    .push(RowOutcome::duplicate_of(&candidate, ConflictSource::Batch));
            } else {
                partition.accepted.push(candidate);
            }
        }

        partition
    }
}
