//! Macro-generated test suite for the `ResourceEngine` contract.
//!
//! The `resource_engine_tests!` macro generates a test module that runs the
//! engine against any `Repository` implementation: tenant isolation, CRUD
//! rules, filtering and pagination, and relation management.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod resource_harness;
//!
//! use resource_harness::*;
//!
//! resource_engine_tests!(InMemoryRepository::new());
//! ```

/// Generate the `ResourceEngine` conformance suite.
///
/// `$factory` must evaluate to a fresh, empty `Repository`. It is re-evaluated
/// for each test.
#[macro_export]
macro_rules! resource_engine_tests {
    ($factory:expr) => {
        mod resource_engine_contract_tests {
            use super::*;
            use tenancy::prelude::*;

            fn not_found_ids(err: Error) -> (String, Vec<Uuid>) {
                match err {
                    Error::Resource(ResourceError::NotFound { resource, ids }) => (resource, ids),
                    other => panic!("expected NotFound, got {:?}", other),
                }
            }

            // ==================================================================
            // Create & Get
            // ==================================================================

            #[tokio::test]
            async fn test_create_assigns_identity_and_tenant() {
                let s = services($factory);
                let tenant = Uuid::new_v4();

                let created = s.tags.create(tenant, &tag("rust", 1)).await.unwrap();

                assert!(created.id.is_some());
                assert_eq!(created.tenant_id, Some(tenant));
                assert_eq!(created.label, "rust");
                assert_eq!(created.rank, 1);
            }

            #[tokio::test]
            async fn test_create_then_get_returns_equal_value() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let mut draft = article("Hello", 12);
                draft.rating = Some(4.5);
                draft.published = true;
                draft.published_on = NaiveDate::from_ymd_opt(2024, 3, 1);

                let created = s.articles.create(tenant, &draft).await.unwrap();
                let fetched = s.articles.get(tenant, created.id.unwrap()).await.unwrap();

                assert_eq!(fetched, created);
                assert_eq!(fetched.published_on, NaiveDate::from_ymd_opt(2024, 3, 1));
                assert!(fetched.tags.is_empty());
            }

            #[tokio::test]
            async fn test_get_from_other_tenant_is_not_found() {
                let s = services($factory);
                let tenant_a = Uuid::new_v4();
                let tenant_b = Uuid::new_v4();

                let created = s.people.create(tenant_a, &person("x", None)).await.unwrap();
                let id = created.id.unwrap();
                let err = s.people.get(tenant_b, id).await.unwrap_err();

                assert_eq!(not_found_ids(err), ("person".to_string(), vec![id]));
            }

            #[tokio::test]
            async fn test_create_rejects_supplied_id() {
                let s = services($factory);
                let mut draft = tag("rust", 1);
                draft.id = Some(Uuid::new_v4());

                let err = s.tags.create(Uuid::new_v4(), &draft).await.unwrap_err();

                assert!(matches!(
                    err,
                    Error::Resource(ResourceError::ConstraintViolation(_))
                ));
            }

            #[tokio::test]
            async fn test_create_rejects_foreign_tenant() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let other = Uuid::new_v4();
                let mut draft = tag("rust", 1);
                draft.tenant_id = Some(other);

                let err = s.tags.create(tenant, &draft).await.unwrap_err();

                assert!(matches!(
                    err,
                    Error::Resource(ResourceError::TenantIdMismatch { expected, actual })
                        if expected == tenant && actual == other
                ));
                assert!(s.tags.list(tenant, None, &PageRequest::default()).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_create_accepts_own_tenant_in_payload() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let mut draft = tag("rust", 1);
                draft.tenant_id = Some(tenant);

                let created = s.tags.create(tenant, &draft).await.unwrap();
                assert_eq!(created.tenant_id, Some(tenant));
            }

            #[tokio::test]
            async fn test_create_rejects_associations() {
                let s = services($factory);
                let mut draft = article("Hello", 0);
                draft.tags = vec![Reference::new("tag", Uuid::new_v4())];

                let err = s.articles.create(Uuid::new_v4(), &draft).await.unwrap_err();

                let Error::Resource(ResourceError::ConstraintViolation(violations)) = err else {
                    panic!("expected ConstraintViolation");
                };
                assert_eq!(violations[0].field, "tags");
            }

            #[tokio::test]
            async fn test_create_runs_field_validation() {
                let s = services($factory);
                let tenant = Uuid::new_v4();

                let err = s.tags.create(tenant, &tag("", 1)).await.unwrap_err();

                let Error::Resource(ResourceError::ConstraintViolation(violations)) = err else {
                    panic!("expected ConstraintViolation");
                };
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].field, "label");
                assert!(s.tags.list(tenant, None, &PageRequest::default()).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_dynamic_create_from_json() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let schema = Tag::schema();

                let payload =
                    Record::from_json(schema, &serde_json::json!({ "label": "json", "rank": 7 }))
                        .unwrap();
                let created = s.engine.create("tag", tenant, payload).await.unwrap();

                assert_eq!(created.tenant_id(schema), Some(tenant));
                assert_eq!(created.value("rank"), &FieldValue::Integer(7));
                let fetched: Tag = s
                    .engine
                    .get("tag", tenant, created.id(schema).unwrap())
                    .await
                    .unwrap()
                    .into_resource()
                    .unwrap();
                assert_eq!(fetched.label, "json");
            }

            #[tokio::test]
            async fn test_unknown_resource() {
                let s = services($factory);
                let err = s.engine.get("comment", Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
                assert!(matches!(
                    err,
                    Error::Resource(ResourceError::UnknownResource { ref resource }) if resource == "comment"
                ));
            }

            // ==================================================================
            // List, filters & pagination
            // ==================================================================

            #[tokio::test]
            async fn test_list_is_tenant_scoped() {
                let s = services($factory);
                let tenant_a = Uuid::new_v4();
                let tenant_b = Uuid::new_v4();
                seed_tags(&s.tags, tenant_a, &[("alpha", 1), ("beta", 2), ("gamma", 3)]).await;
                seed_tags(&s.tags, tenant_b, &[("delta", 4)]).await;

                let page_a = s.tags.list(tenant_a, None, &PageRequest::default()).await.unwrap();
                let page_b = s.tags.list(tenant_b, None, &PageRequest::default()).await.unwrap();

                assert_eq!(page_a.pagination.total, 3);
                assert_eq!(page_b.pagination.total, 1);
                assert!(page_a.data.iter().all(|t| t.tenant_id == Some(tenant_a)));
                assert_eq!(labels(&page_b), vec!["delta"]);

                let filtered = s
                    .tags
                    .list(tenant_b, Some("rank >= 1"), &PageRequest::default())
                    .await
                    .unwrap();
                assert_eq!(labels(&filtered), vec!["delta"]);
            }

            #[tokio::test]
            async fn test_list_filters_and_sorts() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                seed_tags(&s.tags, tenant, &[("alpha", 1), ("beta", 2), ("gamma", 3)]).await;
                let by_rank = PageRequest::default().sorted_by("rank");

                let page = s
                    .tags
                    .list(tenant, Some(r#"rank >= 2 && label != "gamma""#), &by_rank)
                    .await
                    .unwrap();
                assert_eq!(labels(&page), vec!["beta"]);

                let page = s.tags.list(tenant, Some("in(rank, 1, 3)"), &by_rank).await.unwrap();
                assert_eq!(labels(&page), vec!["alpha", "gamma"]);

                let page = s
                    .tags
                    .list(tenant, Some(r#"label matches "b%""#), &by_rank)
                    .await
                    .unwrap();
                assert_eq!(labels(&page), vec!["beta"]);

                let page = s
                    .tags
                    .list(tenant, Some("!(rank == 2)"), &PageRequest::default().sorted_by("rank:desc"))
                    .await
                    .unwrap();
                assert_eq!(labels(&page), vec!["gamma", "alpha"]);
            }

            #[tokio::test]
            async fn test_list_by_identity() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let tags = seed_tags(&s.tags, tenant, &[("a", 1), ("b", 2), ("c", 3), ("d", 4)]).await;
                let wanted = [tags[0].id.unwrap(), tags[2].id.unwrap()];

                let filter = format!(r#"in(id, "{}", "{}")"#, wanted[0], wanted[1]);
                let page = s
                    .tags
                    .list(tenant, Some(filter.as_str()), &PageRequest::default().sorted_by("rank"))
                    .await
                    .unwrap();

                assert_eq!(labels(&page), vec!["a", "c"]);
            }

            #[tokio::test]
            async fn test_list_paginates() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                seed_tags(&s.tags, tenant, &[("a", 1), ("b", 2), ("c", 3)]).await;

                let page = s
                    .tags
                    .list(tenant, None, &PageRequest::new(2, 2).sorted_by("rank"))
                    .await
                    .unwrap();

                assert_eq!(labels(&page), vec!["c"]);
                assert_eq!(page.pagination.page, 2);
                assert_eq!(page.pagination.limit, 2);
                assert_eq!(page.pagination.total, 3);
                assert_eq!(page.pagination.total_pages, 2);
                assert!(page.pagination.has_prev);
                assert!(!page.pagination.has_next);
            }

            #[tokio::test]
            async fn test_list_past_the_last_page_is_empty() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                seed_tags(&s.tags, tenant, &[("a", 1), ("b", 2)]).await;

                let page = s
                    .tags
                    .list(tenant, None, &PageRequest::new(usize::MAX, 10))
                    .await
                    .unwrap();

                assert!(page.is_empty());
                assert_eq!(page.pagination.total, 2);
                assert!(!page.pagination.has_next);
            }

            #[tokio::test]
            async fn test_list_rejects_bad_filters() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let page = PageRequest::default();

                let err = s.tags.list(tenant, Some("color == 1"), &page).await.unwrap_err();
                assert!(matches!(err, Error::Filter(FilterError::UnknownField { .. })));

                let err = s.tags.list(tenant, Some("rank == \"high\""), &page).await.unwrap_err();
                assert!(matches!(err, Error::Filter(FilterError::TypeMismatch { .. })));

                let err = s.tags.list(tenant, Some("like(label, 1)"), &page).await.unwrap_err();
                assert!(matches!(err, Error::Filter(FilterError::UnrecognizedMethod { .. })));

                let err = s.tags.list(tenant, Some("rank >="), &page).await.unwrap_err();
                assert!(matches!(err, Error::Filter(FilterError::Syntax { .. })));

                let err = s
                    .tags
                    .list(tenant, None, &PageRequest::default().sorted_by("color"))
                    .await
                    .unwrap_err();
                assert!(matches!(err, Error::Filter(FilterError::UnknownField { .. })));
            }

            #[tokio::test]
            async fn test_list_null_comparisons() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                s.people.create(tenant, &person("ada", Some(36))).await.unwrap();
                s.people.create(tenant, &person("bob", None)).await.unwrap();

                let page = s.people.list(tenant, Some("age == null"), &PageRequest::default()).await.unwrap();
                assert_eq!(page.data.len(), 1);
                assert_eq!(page.data[0].name, "bob");

                let page = s.people.list(tenant, Some("age >= 18"), &PageRequest::default()).await.unwrap();
                assert_eq!(page.data.len(), 1);
                assert_eq!(page.data[0].name, "ada");
            }

            // ==================================================================
            // Update & Delete
            // ==================================================================

            #[tokio::test]
            async fn test_update_replaces_scalars_keeps_identity_and_associations() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let created = s.articles.create(tenant, &article("Draft", 1)).await.unwrap();
                let id = created.id.unwrap();
                let tags = seed_tags(&s.tags, tenant, &[("rust", 1)]).await;
                s.articles.add_related(tenant, id, "tags", &[tags[0].id.unwrap()]).await.unwrap();

                let mut change = article("Final", 99);
                change.tags = Vec::new();
                let updated = s.articles.update(tenant, id, &change).await.unwrap();

                assert_eq!(updated.id, Some(id));
                assert_eq!(updated.tenant_id, Some(tenant));
                assert_eq!(updated.title, "Final");
                assert_eq!(updated.views, 99);
                assert_eq!(reference_ids(&updated.tags), vec![tags[0].id.unwrap()]);
                assert_eq!(s.articles.get(tenant, id).await.unwrap(), updated);
            }

            #[tokio::test]
            async fn test_update_with_other_id_is_constraint_violation() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let created = s.tags.create(tenant, &tag("rust", 1)).await.unwrap();
                let id = created.id.unwrap();

                let mut change = tag("go", 2);
                change.id = Some(Uuid::new_v4());
                let err = s.tags.update(tenant, id, &change).await.unwrap_err();

                assert!(matches!(
                    err,
                    Error::Resource(ResourceError::ConstraintViolation(_))
                ));
                assert_eq!(s.tags.get(tenant, id).await.unwrap().label, "rust");
            }

            #[tokio::test]
            async fn test_update_with_same_id_succeeds() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let mut created = s.tags.create(tenant, &tag("rust", 1)).await.unwrap();
                created.rank = 5;

                let updated = s.tags.update(tenant, created.id.unwrap(), &created).await.unwrap();
                assert_eq!(updated, created);
            }

            #[tokio::test]
            async fn test_update_with_foreign_tenant_is_rejected() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let created = s.tags.create(tenant, &tag("rust", 1)).await.unwrap();

                let mut change = tag("go", 2);
                change.tenant_id = Some(Uuid::new_v4());
                let err = s.tags.update(tenant, created.id.unwrap(), &change).await.unwrap_err();

                assert!(matches!(
                    err,
                    Error::Resource(ResourceError::TenantIdMismatch { .. })
                ));
            }

            #[tokio::test]
            async fn test_update_across_tenants_is_not_found() {
                let s = services($factory);
                let created = s.tags.create(Uuid::new_v4(), &tag("rust", 1)).await.unwrap();
                let id = created.id.unwrap();

                let err = s.tags.update(Uuid::new_v4(), id, &tag("go", 2)).await.unwrap_err();

                assert_eq!(not_found_ids(err).1, vec![id]);
            }

            #[tokio::test]
            async fn test_delete_removes_row() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let created = s.tags.create(tenant, &tag("rust", 1)).await.unwrap();
                let id = created.id.unwrap();

                s.tags.delete(tenant, id).await.unwrap();

                assert_eq!(not_found_ids(s.tags.get(tenant, id).await.unwrap_err()).1, vec![id]);
                assert_eq!(not_found_ids(s.tags.delete(tenant, id).await.unwrap_err()).1, vec![id]);
            }

            #[tokio::test]
            async fn test_delete_across_tenants_is_not_found() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let created = s.tags.create(tenant, &tag("rust", 1)).await.unwrap();
                let id = created.id.unwrap();

                let err = s.tags.delete(Uuid::new_v4(), id).await.unwrap_err();

                assert_eq!(not_found_ids(err).1, vec![id]);
                assert!(s.tags.get(tenant, id).await.is_ok());
            }

            // ==================================================================
            // Relations
            // ==================================================================

            async fn article_with_tags(
                s: &Services,
                tenant: Uuid,
                rows: &[(&str, i64)],
            ) -> (Uuid, Vec<Uuid>) {
                let owner = s.articles.create(tenant, &article("Owner", 0)).await.unwrap();
                let tags = seed_tags(&s.tags, tenant, rows).await;
                (owner.id.unwrap(), tags.iter().filter_map(|t| t.id).collect())
            }

            #[tokio::test]
            async fn test_add_related_links_by_reference() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let (owner, t) = article_with_tags(&s, tenant, &[("a", 1), ("b", 2), ("c", 3)]).await;

                let updated = s.articles.add_related(tenant, owner, "tags", &[t[0], t[1]]).await.unwrap();

                assert_eq!(reference_ids(&updated.tags), vec![t[0], t[1]]);
                assert!(updated.tags.iter().all(|r| r.resource_type == "tag"));

                let related = s
                    .articles
                    .get_related::<Tag>(tenant, owner, "tags", None, &PageRequest::default().sorted_by("rank"))
                    .await
                    .unwrap();
                assert_eq!(labels(&related), vec!["a", "b"]);
                assert_eq!(related.pagination.total, 2);
            }

            #[tokio::test]
            async fn test_add_related_twice_leaves_union() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let (owner, t) = article_with_tags(&s, tenant, &[("t1", 1), ("t2", 2), ("t3", 3)]).await;

                s.articles.add_related(tenant, owner, "tags", &[t[0], t[1]]).await.unwrap();
                let updated = s.articles.add_related(tenant, owner, "tags", &[t[1], t[2]]).await.unwrap();

                assert_eq!(reference_ids(&updated.tags), vec![t[0], t[1], t[2]]);

                let again = s.articles.add_related(tenant, owner, "tags", &[t[1], t[2]]).await.unwrap();
                assert_eq!(again, updated);
            }

            #[tokio::test]
            async fn test_add_related_collapses_duplicate_ids() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let (owner, t) = article_with_tags(&s, tenant, &[("a", 1), ("b", 2)]).await;

                let updated = s
                    .articles
                    .add_related(tenant, owner, "tags", &[t[1], t[0], t[1]])
                    .await
                    .unwrap();

                assert_eq!(reference_ids(&updated.tags), vec![t[1], t[0]]);
            }

            #[tokio::test]
            async fn test_add_related_with_missing_id_changes_nothing() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let (owner, t) = article_with_tags(&s, tenant, &[("a", 1)]).await;
                let missing = Uuid::new_v4();

                let err = s
                    .articles
                    .add_related(tenant, owner, "tags", &[t[0], missing])
                    .await
                    .unwrap_err();

                assert_eq!(not_found_ids(err), ("tag".to_string(), vec![missing]));
                assert!(s.articles.get(tenant, owner).await.unwrap().tags.is_empty());
            }

            #[tokio::test]
            async fn test_add_related_from_other_tenant_is_missing() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let (owner, _) = article_with_tags(&s, tenant, &[]).await;
                let foreign = seed_tags(&s.tags, Uuid::new_v4(), &[("x", 1)]).await;
                let foreign_id = foreign[0].id.unwrap();

                let err = s
                    .articles
                    .add_related(tenant, owner, "tags", &[foreign_id])
                    .await
                    .unwrap_err();

                assert_eq!(not_found_ids(err).1, vec![foreign_id]);
            }

            #[tokio::test]
            async fn test_add_related_to_missing_owner() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let tags = seed_tags(&s.tags, tenant, &[("a", 1)]).await;
                let owner = Uuid::new_v4();

                let err = s
                    .articles
                    .add_related(tenant, owner, "tags", &[tags[0].id.unwrap()])
                    .await
                    .unwrap_err();

                assert_eq!(not_found_ids(err), ("article".to_string(), vec![owner]));
            }

            #[tokio::test]
            async fn test_delete_related_unlinks() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let (owner, t) = article_with_tags(&s, tenant, &[("a", 1), ("b", 2), ("c", 3)]).await;
                s.articles.add_related(tenant, owner, "tags", &t).await.unwrap();

                let updated = s.articles.delete_related(tenant, owner, "tags", &[t[1]]).await.unwrap();

                assert_eq!(reference_ids(&updated.tags), vec![t[0], t[2]]);
                // the related row itself survives
                assert!(s.tags.get(tenant, t[1]).await.is_ok());
            }

            #[tokio::test]
            async fn test_delete_related_with_unlinked_id_changes_nothing() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let (owner, t) = article_with_tags(&s, tenant, &[("t1", 1), ("t2", 2), ("t3", 3)]).await;
                s.articles.add_related(tenant, owner, "tags", &t).await.unwrap();
                let never_linked = Uuid::new_v4();

                let err = s
                    .articles
                    .delete_related(tenant, owner, "tags", &[t[0], never_linked])
                    .await
                    .unwrap_err();

                assert_eq!(not_found_ids(err), ("tag".to_string(), vec![never_linked]));
                let owner = s.articles.get(tenant, owner).await.unwrap();
                assert_eq!(reference_ids(&owner.tags), t);
            }

            #[tokio::test]
            async fn test_get_related_filters_and_paginates() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let (owner, t) = article_with_tags(
                    &s,
                    tenant,
                    &[("a", 1), ("b", 2), ("c", 3), ("d", 4), ("unlinked", 5)],
                )
                .await;
                s.articles.add_related(tenant, owner, "tags", &t[..4]).await.unwrap();

                let page = s
                    .articles
                    .get_related::<Tag>(
                        tenant,
                        owner,
                        "tags",
                        Some("in(rank, 1, 2, 3, 5)"),
                        &PageRequest::new(1, 2).sorted_by("rank"),
                    )
                    .await
                    .unwrap();

                assert_eq!(labels(&page), vec!["a", "b"]);
                assert_eq!(page.pagination.total, 3);
                assert!(page.pagination.has_next);
            }

            #[tokio::test]
            async fn test_get_related_without_links_is_empty() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let (owner, _) = article_with_tags(&s, tenant, &[("a", 1)]).await;

                let page = s
                    .articles
                    .get_related::<Tag>(tenant, owner, "tags", None, &PageRequest::default())
                    .await
                    .unwrap();

                assert!(page.is_empty());
                assert_eq!(page.pagination.total, 0);
            }

            #[tokio::test]
            async fn test_get_related_of_other_tenant_owner_is_not_found() {
                let s = services($factory);
                let (owner, _) = article_with_tags(&s, Uuid::new_v4(), &[]).await;

                let err = s
                    .articles
                    .get_related::<Tag>(Uuid::new_v4(), owner, "tags", None, &PageRequest::default())
                    .await
                    .unwrap_err();

                assert_eq!(not_found_ids(err), ("article".to_string(), vec![owner]));
            }

            #[tokio::test]
            async fn test_relations_in_both_directions() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let reader = s.people.create(tenant, &person("ada", Some(36))).await.unwrap();
                let post = s.articles.create(tenant, &article("Hello", 1)).await.unwrap();

                let reader = s
                    .people
                    .add_related(tenant, reader.id.unwrap(), "followed", &[post.id.unwrap()])
                    .await
                    .unwrap();

                let followed = s
                    .people
                    .get_related::<Article>(tenant, reader.id.unwrap(), "followed", None, &PageRequest::default())
                    .await
                    .unwrap();
                assert_eq!(followed.data.len(), 1);
                assert_eq!(followed.data[0].title, "Hello");
            }

            #[tokio::test]
            async fn test_inverse_and_unknown_relations_are_rejected() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let post = s.articles.create(tenant, &article("Hello", 1)).await.unwrap();
                let id = post.id.unwrap();

                for relation in ["followers", "authors", "Tags"] {
                    let err = s
                        .articles
                        .add_related(tenant, id, relation, &[Uuid::new_v4()])
                        .await
                        .unwrap_err();
                    assert!(
                        matches!(err, Error::Resource(ResourceError::UnknownRelation { .. })),
                        "{} should be unknown, got {:?}",
                        relation,
                        err
                    );
                }
            }

            #[tokio::test]
            async fn test_get_related_with_wrong_type_is_mismatch() {
                let s = services($factory);
                let tenant = Uuid::new_v4();
                let (owner, _) = article_with_tags(&s, tenant, &[]).await;

                let err = s
                    .articles
                    .get_related::<Person>(tenant, owner, "tags", None, &PageRequest::default())
                    .await
                    .unwrap_err();

                assert!(matches!(
                    err,
                    Error::Resource(ResourceError::RelationTypeMismatch { .. })
                ));
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[tokio::test]
            async fn test_concurrent_creates() {
                let s = services($factory);
                let tenant = Uuid::new_v4();

                let mut handles = Vec::new();
                for i in 0..10 {
                    let tags = s.tags.clone();
                    handles.push(tokio::spawn(async move {
                        tags.create(tenant, &tag(&format!("tag-{}", i), i)).await
                    }));
                }
                for handle in handles {
                    handle.await.unwrap().unwrap();
                }

                let page = s.tags.list(tenant, None, &PageRequest::default()).await.unwrap();
                assert_eq!(page.pagination.total, 10);
            }
        }
    };
}
