// ==========================================
// 学校管理后台 - 批量写入器实现
// ==========================================
// 职责: 将去重后的候选记录整批写入花名册存储
// 红线: 空集不调用存储；存储调用最多一次
// ==========================================

use crate::domain::roster::{Candidate, CommitResult};
use crate::domain::types::EntityKind;
use crate::importer::roster_importer_trait::ImportCommitter;
use crate::repository::roster_store::RosterStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

pub struct StoreCommitter<S>
where
    S: RosterStore,
{
    store: Arc<S>,
}

impl<S> StoreCommitter<S>
where
    S: RosterStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> ImportCommitter for StoreCommitter<S>
where
    S: RosterStore,
{
    async fn commit(&self, kind: EntityKind, accepted: &[Candidate]) -> CommitResult {
        if accepted.is_empty() {
            return CommitResult::NoOp;
        }

        match self.store.batch_insert(kind, accepted).await {
            Ok(inserted) => {
                info!(entity_kind = %kind, inserted, "花名册批量写入完成");
                CommitResult::Committed { inserted }
            }
            Err(e) => {
                error!(entity_kind = %kind, records = accepted.len(), error = %e, "花名册批量写入失败，整批回滚");
                CommitResult::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::TargetField;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use std::collections::{BTreeMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RosterStore for CountingStore {
        async fn list_identity_keys(&self, _kind: EntityKind) -> RepositoryResult<HashSet<String>> {
            Ok(HashSet::new())
        }

        async fn batch_insert(&self, _kind: EntityKind, records: &[Candidate]) -> RepositoryResult<usize> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()))
            } else {
                Ok(records.len())
            }
        }
    }

    fn committer(fail: bool) -> (Arc<CountingStore>, StoreCommitter<CountingStore>) {
        let store = Arc::new(CountingStore {
            calls: AtomicUsize::new(0),
            fail,
        });
        (store.clone(), StoreCommitter::new(store))
    }

    fn candidate(user_id: &str) -> Candidate {
        let mut fields = BTreeMap::new();
        fields.insert(TargetField::UserId, user_id.to_string());
        Candidate {
            row_number: 2,
            name: "Alice Smith".to_string(),
            identity_key: user_id.to_string(),
            fields,
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let (store, committer) = committer(false);

        let result = committer.commit(EntityKind::Student, &[]).await;

        assert_eq!(result, CommitResult::NoOp);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_commit_calls_store_once() {
        let (store, committer) = committer(false);

        let result = committer
            .commit(EntityKind::Student, &[candidate("a.one"), candidate("b.two")])
            .await;

        assert_eq!(result, CommitResult::Committed { inserted: 2 });
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_failure_becomes_failed_result() {
        let (_store, committer) = committer(true);

        match committer.commit(EntityKind::Staff, &[candidate("a.one")]).await {
            CommitResult::Failed { reason } => assert!(reason.contains("disk I/O error")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
