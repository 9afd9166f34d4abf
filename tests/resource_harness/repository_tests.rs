//! Macro-generated test suite for the `Repository` contract.
//!
//! Any store the engine runs against must honour these: writes are invisible
//! until commit, rollback discards them, queries filter, order and paginate,
//! and association collections survive a save.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod resource_harness;
//!
//! use resource_harness::*;
//!
//! repository_contract_tests!(InMemoryRepository::new());
//! ```

/// Generate the `Repository` conformance suite.
///
/// `$factory` must evaluate to a fresh, empty `Repository`.
#[macro_export]
macro_rules! repository_contract_tests {
    ($factory:expr) => {
        mod repository_contract_tests {
            use super::*;
            use tenancy::prelude::*;

            fn tag_row(tenant: Uuid, label: &str, rank: i64) -> Record {
                Record::new()
                    .with("id", FieldValue::Uuid(Uuid::new_v4()))
                    .with("tenant_id", FieldValue::Uuid(tenant))
                    .with("label", FieldValue::String(label.to_string()))
                    .with("rank", FieldValue::Integer(rank))
            }

            async fn seed(repo: &dyn Repository, rows: Vec<Record>) {
                let mut tx = repo.begin().await.unwrap();
                for row in rows {
                    tx.save(Tag::schema(), row).await.unwrap();
                }
                tx.commit().await.unwrap();
            }

            async fn all_labels(repo: &dyn Repository) -> Vec<String> {
                let mut tx = repo.begin().await.unwrap();
                let rows = tx
                    .find(Tag::schema(), &Query::default().sorted(vec![Sort::asc("rank")]))
                    .await
                    .unwrap();
                tx.rollback().await.unwrap();
                rows.iter()
                    .filter_map(|r| r.value("label").as_string().map(str::to_string))
                    .collect()
            }

            #[tokio::test]
            async fn test_commit_makes_writes_visible() {
                let repo = $factory;
                let tenant = Uuid::new_v4();

                seed(&repo, vec![tag_row(tenant, "a", 1), tag_row(tenant, "b", 2)]).await;

                assert_eq!(all_labels(&repo).await, vec!["a", "b"]);
            }

            #[tokio::test]
            async fn test_rollback_discards_writes() {
                let repo = $factory;
                let tenant = Uuid::new_v4();
                seed(&repo, vec![tag_row(tenant, "kept", 1)]).await;

                let mut tx = repo.begin().await.unwrap();
                tx.save(Tag::schema(), tag_row(tenant, "discarded", 2)).await.unwrap();
                let deleted = tx
                    .delete(Tag::schema(), &Predicate::eq("label", FieldValue::String("kept".into())))
                    .await
                    .unwrap();
                assert_eq!(deleted, 1);
                tx.rollback().await.unwrap();

                assert_eq!(all_labels(&repo).await, vec!["kept"]);
            }

            #[tokio::test]
            async fn test_transaction_reads_its_own_writes() {
                let repo = $factory;
                let tenant = Uuid::new_v4();

                let mut tx = repo.begin().await.unwrap();
                tx.save(Tag::schema(), tag_row(tenant, "pending", 1)).await.unwrap();
                let count = tx.count(Tag::schema(), None).await.unwrap();
                tx.commit().await.unwrap();

                assert_eq!(count, 1);
            }

            #[tokio::test]
            async fn test_find_filters_orders_and_paginates() {
                let repo = $factory;
                let tenant = Uuid::new_v4();
                seed(
                    &repo,
                    (1..=5).map(|i| tag_row(tenant, &format!("t{}", i), i)).collect(),
                )
                .await;

                let predicate = Predicate::Compare {
                    field: "rank".into(),
                    op: CompareOp::Ge,
                    value: FieldValue::Integer(2),
                };
                let mut tx = repo.begin().await.unwrap();
                let total = tx.count(Tag::schema(), Some(&predicate)).await.unwrap();
                let rows = tx
                    .find(
                        Tag::schema(),
                        &Query::filtered(predicate)
                            .sorted(vec![Sort::desc("rank")])
                            .offset(1)
                            .limit(2),
                    )
                    .await
                    .unwrap();
                tx.rollback().await.unwrap();

                assert_eq!(total, 4);
                let ranks: Vec<_> = rows.iter().map(|r| r.value("rank").clone()).collect();
                assert_eq!(ranks, vec![FieldValue::Integer(4), FieldValue::Integer(3)]);
            }

            #[tokio::test]
            async fn test_save_replaces_by_identity() {
                let repo = $factory;
                let tenant = Uuid::new_v4();
                let row = tag_row(tenant, "before", 1);
                seed(&repo, vec![row.clone()]).await;

                let changed = row.with("label", FieldValue::String("after".into()));
                seed(&repo, vec![changed]).await;

                assert_eq!(all_labels(&repo).await, vec!["after"]);
            }

            #[tokio::test]
            async fn test_associations_survive_save() {
                let repo = $factory;
                let tenant = Uuid::new_v4();
                let tag_id = Uuid::new_v4();
                let id = Uuid::new_v4();
                let mut row = Record::new()
                    .with("id", FieldValue::Uuid(id))
                    .with("tenant_id", FieldValue::Uuid(tenant))
                    .with("title", FieldValue::String("x".into()));
                row.set_references("tags", vec![Reference::new("tag", tag_id)]);

                let mut tx = repo.begin().await.unwrap();
                tx.save(Article::schema(), row).await.unwrap();
                tx.commit().await.unwrap();

                let mut tx = repo.begin().await.unwrap();
                let rows = tx
                    .find(
                        Article::schema(),
                        &Query::filtered(Predicate::eq("id", FieldValue::Uuid(id))),
                    )
                    .await
                    .unwrap();
                tx.rollback().await.unwrap();

                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].references("tags"), &[Reference::new("tag", tag_id)]);
            }

            #[tokio::test]
            async fn test_delete_reports_affected_rows() {
                let repo = $factory;
                let tenant = Uuid::new_v4();
                seed(&repo, vec![tag_row(tenant, "a", 1), tag_row(tenant, "b", 1)]).await;

                let mut tx = repo.begin().await.unwrap();
                let none = tx
                    .delete(Tag::schema(), &Predicate::eq("rank", FieldValue::Integer(9)))
                    .await
                    .unwrap();
                let both = tx
                    .delete(Tag::schema(), &Predicate::eq("rank", FieldValue::Integer(1)))
                    .await
                    .unwrap();
                tx.commit().await.unwrap();

                assert_eq!((none, both), (0, 2));
                assert!(all_labels(&repo).await.is_empty());
            }
        }
    };
}
