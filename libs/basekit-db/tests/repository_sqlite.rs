#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

#[cfg(feature = "sqlite")]
mod repository_tests {
    use basekit_db::{Filters, OrderBy, RepoError, Repository, Values, WriteOptions};
    use serde_json::json;

    use crate::common::{sessions, tag, user};

    fn person(email: &str, name: &str, age: i32) -> Values {
        Values::new()
            .with("email", email)
            .with("name", name)
            .with("age", age)
    }

    async fn users() -> Repository<user::Entity> {
        Repository::new(sessions().await).unwrap()
    }

    async fn seeded() -> Repository<user::Entity> {
        let repo = users().await;
        repo.bulk_create(
            &[
                person("ann@x.io", "Ann", 31),
                person("bob@x.io", "Bob", 17),
                person("cid@x.io", "Cid", 45),
                person("dee@x.io", "Dee", 17),
                person("eve@x.io", "eve", 28),
            ],
            WriteOptions::default(),
        )
        .await
        .unwrap();
        repo
    }

    fn by_email(email: &str) -> Filters {
        Filters::new().with("email", email)
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamps() {
        let repo = users().await;
        let created = repo
            .create(&person("ann@x.io", "Ann", 31), WriteOptions::default())
            .await
            .unwrap();

        assert!(created.id > 0);
        assert!(!created.deleted);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.nickname, None);
    }

    #[tokio::test]
    async fn create_rejects_unknown_fields_and_bad_values() {
        let repo = users().await;

        let err = repo
            .create(&person("a@x.io", "A", 1).with("role", "admin"), WriteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidField(ref f) if f == "role"));

        let err = repo
            .create(&person("a@x.io", "A", 1).with("age", "old"), WriteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidValue { got: "string", .. }));

        assert_eq!(repo.count(&Filters::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_unique_value_is_a_constraint_error() {
        let repo = users().await;
        repo.create(&person("ann@x.io", "Ann", 31), WriteOptions::default())
            .await
            .unwrap();

        let err = repo
            .create(&person("ann@x.io", "Other", 20), WriteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)), "{err:?}");
        assert_eq!(err.to_problem().status.as_u16(), 500);
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn missing_required_column_is_a_constraint_error() {
        let repo = users().await;
        let err = repo
            .create(&Values::new().with("email", "x@x.io"), WriteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)), "{err:?}");
    }

    #[tokio::test]
    async fn get_requires_exactly_one_match() {
        let repo = seeded().await;

        let bob = repo.get(&by_email("bob@x.io")).await.unwrap();
        assert_eq!(bob.name, "Bob");

        let err = repo.get(&by_email("nobody@x.io")).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));

        let err = repo.get(&Filters::new().with("age", 17)).await.unwrap_err();
        assert!(matches!(err, RepoError::MultipleResults { .. }));
    }

    #[tokio::test]
    async fn exact_lookups_reject_operator_suffixes() {
        let repo = seeded().await;
        let err = repo
            .find(&Filters::new().with("age__gt", 20))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidField(_)));
    }

    #[tokio::test]
    async fn get_or_create_creates_once() {
        let repo = users().await;
        let filters = by_email("new@x.io");
        let defaults = Values::new().with("name", "New").with("age", 20);

        let (first, created) = repo
            .get_or_create(&filters, &defaults, WriteOptions::default())
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.name, "New");

        let (again, created) = repo
            .get_or_create(&filters, &defaults, WriteOptions::default())
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);
        assert_eq!(repo.count(&Filters::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_or_create_applies_defaults_to_existing_row() {
        let repo = seeded().await;

        let (updated, created) = repo
            .update_or_create(
                &by_email("ann@x.io"),
                &Values::new(),
                &Values::new().with("age", 32),
                WriteOptions::default(),
            )
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(updated.age, 32);

        let (fresh, created) = repo
            .update_or_create(
                &by_email("zed@x.io"),
                &Values::new().with("name", "Zed"),
                &Values::new().with("age", 50),
                WriteOptions::default(),
            )
            .await
            .unwrap();
        assert!(created);
        assert_eq!((fresh.name.as_str(), fresh.age), ("Zed", 50));
        assert_eq!(fresh.email, "zed@x.io");
    }

    #[tokio::test]
    async fn filter_supports_operators_and_default_order() {
        let repo = seeded().await;

        let adults = repo
            .filter(&Filters::new().with("age__gte", 18), &[])
            .await
            .unwrap();
        let names: Vec<_> = adults.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["eve", "Cid", "Ann"]);

        let picked = repo
            .filter(
                &Filters::new().with("name__in", json!(["Ann", "Bob"])),
                &[OrderBy::asc("name")],
            )
            .await
            .unwrap();
        let names: Vec<_> = picked.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Ann", "Bob"]);

        let ci = repo
            .filter(&Filters::new().with("name__ilike", "E%"), &[])
            .await
            .unwrap();
        assert_eq!(ci.len(), 1);
        assert_eq!(ci[0].email, "eve@x.io");

        let none = repo
            .filter(&Filters::new().with("age__lt", 0).with("name__ne", "Ann"), &[])
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn filter_on_null() {
        let repo = seeded().await;
        repo.update(
            &by_email("cid@x.io"),
            &Values::new().with("nickname", "C"),
            WriteOptions::default(),
        )
        .await
        .unwrap();

        let without = repo
            .filter(&Filters::new().with("nickname", json!(null)), &[])
            .await
            .unwrap();
        assert_eq!(without.len(), 4);

        let with = repo
            .filter(&Filters::new().with("nickname__ne", json!(null)), &[])
            .await
            .unwrap();
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].nickname.as_deref(), Some("C"));
    }

    #[tokio::test]
    async fn filter_errors_surface_before_querying() {
        let repo = seeded().await;

        let err = repo
            .filter(&Filters::new().with("salary__gt", 1), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidField(ref f) if f == "salary"));

        let err = repo
            .filter(&Filters::new().with("age__near", 1), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::UnsupportedOperator(_)));

        let err = repo
            .filter(&Filters::new(), &[OrderBy::desc("salary")])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidField(_)));
    }

    #[tokio::test]
    async fn find_orders_by_id() {
        let repo = seeded().await;
        let teens = repo.find(&Filters::new().with("age", 17)).await.unwrap();
        let names: Vec<_> = teens.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Bob", "Dee"]);
    }

    #[tokio::test]
    async fn update_changes_fields_and_touches_updated_at() {
        let repo = seeded().await;
        let before = repo.get(&by_email("bob@x.io")).await.unwrap();

        let after = repo
            .update(
                &Filters::new().with("email__ilike", "BOB@%"),
                &Values::new().with("age", 18),
                WriteOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.age, 18);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn update_rejects_id_changes() {
        let repo = seeded().await;
        let err = repo
            .update(
                &by_email("bob@x.io"),
                &Values::new().with("id", 99),
                WriteOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::ImmutableField(ref f) if f == "id"));
        assert_eq!(err.to_problem().status.as_u16(), 400);
    }

    #[tokio::test]
    async fn update_requires_a_single_match() {
        let repo = seeded().await;
        let err = repo
            .update(
                &Filters::new().with("age", 17),
                &Values::new().with("age", 18),
                WriteOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::MultipleResults { .. }));
        assert_eq!(repo.count(&Filters::new().with("age", 17)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_instance_applies_data() {
        let repo = seeded().await;
        let ann = repo.get(&by_email("ann@x.io")).await.unwrap();

        let renamed = repo
            .update_instance(ann, &Values::new().with("name", "Anne"), WriteOptions::default())
            .await
            .unwrap();
        assert_eq!(renamed.name, "Anne");
        assert_eq!(repo.get(&by_email("ann@x.io")).await.unwrap().name, "Anne");
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let repo = seeded().await;
        let gone = repo
            .delete(&by_email("cid@x.io"), WriteOptions::default())
            .await
            .unwrap();
        assert_eq!(gone.name, "Cid");
        assert_eq!(repo.count(&Filters::new()).await.unwrap(), 4);
        assert_eq!(repo.including_deleted().count(&Filters::new()).await.unwrap(), 4);

        let err = repo
            .delete(&by_email("cid@x.io"), WriteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_hidden_by_default() {
        let repo = seeded().await;
        let flagged = repo
            .soft_delete(&by_email("cid@x.io"), WriteOptions::default())
            .await
            .unwrap();
        assert!(flagged.deleted);

        assert!(matches!(
            repo.get(&by_email("cid@x.io")).await,
            Err(RepoError::NotFound { .. })
        ));
        assert_eq!(repo.count(&Filters::new()).await.unwrap(), 4);

        let all = repo.including_deleted();
        assert!(all.get(&by_email("cid@x.io")).await.unwrap().deleted);
        assert_eq!(all.count(&Filters::new()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn count_and_exists() {
        let repo = seeded().await;
        assert_eq!(repo.count(&Filters::new()).await.unwrap(), 5);
        assert_eq!(repo.count(&Filters::new().with("age", 17)).await.unwrap(), 2);

        assert!(repo.exists(&Filters::new().with("age__gt", 40)).await.unwrap());
        assert!(!repo.exists(&Filters::new().with("age__gt", 60)).await.unwrap());
    }

    #[tokio::test]
    async fn bulk_create_is_all_or_nothing() {
        let repo = users().await;

        let err = repo
            .bulk_create(
                &[person("a@x.io", "A", 1), person("b@x.io", "B", 2).with("bogus", 1)],
                WriteOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidField(_)));

        let err = repo
            .bulk_create(
                &[person("a@x.io", "A", 1), person("a@x.io", "B", 2)],
                WriteOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));

        assert_eq!(repo.count(&Filters::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bulk_create_with_empty_input() {
        let repo = users().await;
        let created = repo.bulk_create(&[], WriteOptions::default()).await.unwrap();
        assert!(created.is_empty());
    }

    #[tokio::test]
    async fn paginate_windows_by_id() {
        let repo = seeded().await;

        let page = repo.paginate(2, 2, &Filters::new()).await.unwrap();
        let names: Vec<_> = page.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Cid", "Dee"]);

        let tail = repo.paginate(10, 4, &Filters::new()).await.unwrap();
        assert_eq!(tail.len(), 1);

        let teens = repo
            .paginate(1, 1, &Filters::new().with("age", 17))
            .await
            .unwrap();
        assert_eq!(teens[0].name, "Dee");
    }

    #[tokio::test]
    async fn get_ordered_breaks_ties_by_id() {
        let repo = seeded().await;

        let by_age = repo.get_ordered("age", false, &Filters::new()).await.unwrap();
        let names: Vec<_> = by_age.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Bob", "Dee", "eve", "Ann", "Cid"]);

        let oldest = repo.get_ordered("AGE", true, &Filters::new()).await.unwrap();
        assert_eq!(oldest[0].name, "Cid");

        let err = repo
            .get_ordered("salary", true, &Filters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidField(_)));
    }

    #[tokio::test]
    async fn first_last_and_get_all() {
        let repo = seeded().await;

        let first = repo.first(&Filters::new().with("age__lt", 30)).await.unwrap();
        assert_eq!(first.unwrap().name, "Bob");

        let last = repo.last(&Filters::new().with("age", 17)).await.unwrap();
        assert_eq!(last.unwrap().name, "Dee");

        assert!(repo.first(&Filters::new().with("age__gt", 99)).await.unwrap().is_none());
        assert!(repo.last(&by_email("nobody@x.io")).await.unwrap().is_none());

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn create_then_get_returns_the_same_row() {
        let repo = users().await;
        let created = repo
            .create(
                &person("rt@x.io", "Round", 44).with("nickname", "trip"),
                WriteOptions::default(),
            )
            .await
            .unwrap();

        let fetched = repo.get(&Filters::new().with("id", created.id)).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let repo = seeded().await;
        repo.delete(&by_email("bob@x.io"), WriteOptions::default())
            .await
            .unwrap();

        let err = repo.get(&by_email("bob@x.io")).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn update_or_create_never_duplicates() {
        let repo = users().await;
        let filters = by_email("once@x.io");
        let data = Values::new().with("name", "Once");

        let mut flags = Vec::new();
        let mut ids = Vec::new();
        for age in [20, 21, 22] {
            let (row, created) = repo
                .update_or_create(
                    &filters,
                    &data,
                    &Values::new().with("age", age),
                    WriteOptions::default(),
                )
                .await
                .unwrap();
            flags.push(created);
            ids.push(row.id);
            assert_eq!(row.age, age);
        }

        assert_eq!(flags, [true, false, false]);
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(repo.count(&Filters::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn consecutive_pages_are_disjoint_and_ordered() {
        let repo = users().await;
        repo.bulk_create(
            &[
                person("p1@x.io", "P1", 1),
                person("p2@x.io", "P2", 2),
                person("p3@x.io", "P3", 3),
                person("p4@x.io", "P4", 4),
            ],
            WriteOptions::default(),
        )
        .await
        .unwrap();

        let first = repo.paginate(2, 0, &Filters::new()).await.unwrap();
        let second = repo.paginate(2, 2, &Filters::new()).await.unwrap();
        assert_eq!((first.len(), second.len()), (2, 2));
        assert!(first.iter().all(|a| second.iter().all(|b| a.id != b.id)));

        let paged: Vec<_> = first.iter().chain(&second).map(|u| u.id).collect();
        let ordered: Vec<_> = repo
            .get_ordered("id", false, &Filters::new())
            .await
            .unwrap()
            .iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(paged, ordered);
    }

    #[tokio::test]
    async fn paginate_accepts_oversized_windows() {
        let repo = seeded().await;

        let everything = repo.paginate(u64::MAX, 0, &Filters::new()).await.unwrap();
        assert_eq!(everything.len(), 5);

        let past_end = repo.paginate(10, u64::MAX, &Filters::new()).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn filter_breaks_ties_by_id_after_explicit_order() {
        let repo = seeded().await;

        let young_first = repo.filter(&Filters::new(), &[OrderBy::asc("age")]).await.unwrap();
        let names: Vec<_> = young_first.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Bob", "Dee", "eve", "Ann", "Cid"]);

        let old_first = repo.filter(&Filters::new(), &[OrderBy::parse("-age")]).await.unwrap();
        let names: Vec<_> = old_first.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Cid", "Ann", "eve", "Bob", "Dee"]);
    }

    #[tokio::test]
    async fn get_or_create_restores_a_soft_deleted_row() {
        let repo = users().await;
        let original = repo
            .create(&person("s@x.io", "Gone", 30), WriteOptions::default())
            .await
            .unwrap();
        repo.soft_delete(&by_email("s@x.io"), WriteOptions::default())
            .await
            .unwrap();

        let (restored, created) = repo
            .get_or_create(
                &by_email("s@x.io"),
                &Values::new().with("name", "Back").with("age", 31),
                WriteOptions::default(),
            )
            .await
            .unwrap();
        assert!(created);
        assert_eq!(restored.id, original.id);
        assert!(!restored.deleted);
        assert_eq!((restored.name.as_str(), restored.age), ("Back", 31));

        let (again, created) = repo
            .get_or_create(&by_email("s@x.io"), &Values::new(), WriteOptions::default())
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(again.id, original.id);
        assert_eq!(repo.including_deleted().count(&Filters::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_or_create_restores_a_soft_deleted_row() {
        let repo = users().await;
        let original = repo
            .create(&person("u@x.io", "Old", 30), WriteOptions::default())
            .await
            .unwrap();
        repo.soft_delete(&by_email("u@x.io"), WriteOptions::default())
            .await
            .unwrap();

        let (restored, created) = repo
            .update_or_create(
                &by_email("u@x.io"),
                &Values::new().with("name", "New"),
                &Values::new().with("age", 33),
                WriteOptions::default(),
            )
            .await
            .unwrap();
        assert!(created);
        assert_eq!(restored.id, original.id);
        assert!(!restored.deleted);
        assert_eq!((restored.name.as_str(), restored.age), ("New", 33));
        assert_eq!(repo.count(&Filters::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn entity_without_conventional_columns() {
        let tags = Repository::<tag::Entity>::new(sessions().await).unwrap();
        let t = tags
            .create(&Values::new().with("label", "rust"), WriteOptions::default())
            .await
            .unwrap();
        assert_eq!(t.label, "rust");

        let err = tags
            .soft_delete(&Filters::new().with("label", "rust"), WriteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::SoftDeleteUnsupported(_)));

        tags.delete(&Filters::new().with("id", t.id), WriteOptions::default())
            .await
            .unwrap();
        assert!(tags.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn without_refresh_returns_the_written_row() {
        let repo = users().await;
        let created = repo
            .create(
                &person("ann@x.io", "Ann", 31),
                WriteOptions::default().without_refresh(),
            )
            .await
            .unwrap();
        assert_eq!(created.email, "ann@x.io");
        assert_eq!(repo.count(&Filters::new()).await.unwrap(), 1);
    }
}
