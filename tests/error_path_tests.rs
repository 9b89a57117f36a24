//! Failure-path coverage: repository guards, operation tagging on errors,
//! factory configuration, and undo replays against a drifted table.

use std::io::Write;

use tempfile::NamedTempFile;

use dcw_rust::api::DatasetId;
use dcw_rust::db::factory::REPOSITORY_TYPE_ENV;
use dcw_rust::db::repository::RepositoryError;
use dcw_rust::db::{RepositoryFactory, RepositoryType};
use dcw_rust::models::{Column, ColumnOrdering, ColumnType, TableQuery, Value};
use dcw_rust::routes::dedup::{DedupConfig, START_DEDUP};
use dcw_rust::routes::transformations::{ImputeMethod, IMPUTE_MISSING_DATA, UNDO_ACTION};
use dcw_rust::services::{DedupEngine, TransformExecutor};

mod support;

// =========================================================
// Repository Guards
// =========================================================

#[tokio::test]
async fn test_delete_rows_is_all_or_nothing() {
    let repo = support::repo();
    support::seed_people(&repo).await;

    let err = repo
        .delete_rows(support::dataset(), "people", &[1, 99])
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    // nothing was deleted, including the known id
    assert_eq!(
        repo.row_count(support::dataset(), "people").await.unwrap(),
        3
    );
}

#[tokio::test]
async fn test_update_values_validates_the_whole_batch() {
    let repo = support::repo();
    support::seed_people(&repo).await;

    let err = repo
        .update_values(
            support::dataset(),
            "people",
            "age",
            &[(1, Value::Int(50)), (99, Value::Int(60))],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    let err = repo
        .update_values(
            support::dataset(),
            "people",
            "age",
            &[(1, support::text("not an age"))],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    // row 1 kept its original value through both failed batches
    let table = repo
        .get_table(support::dataset(), "people", &TableQuery::all())
        .await
        .unwrap();
    assert_eq!(support::cell_of(&table, 1, "age"), Value::Int(30));
}

#[tokio::test]
async fn test_id_column_is_immutable() {
    let repo = support::repo();
    support::seed_people(&repo).await;
    let dataset = support::dataset();

    let err = repo
        .update_values(dataset, "people", "id", &[(1, Value::Int(7))])
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let err = repo.delete_column(dataset, "people", "id").await.unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let err = repo
        .rename_column(dataset, "people", "id", "row")
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let err = repo
        .update_column_type(dataset, "people", "id", ColumnType::Text)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
}

#[tokio::test]
async fn test_update_column_type_rejects_incoercible_cells() {
    let repo = support::repo();
    support::seed_people(&repo).await;

    // "ada" is not an integer, so the whole conversion is refused
    let err = repo
        .update_column_type(support::dataset(), "people", "name", ColumnType::Integer)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let columns = repo
        .get_column_names_and_types(support::dataset(), "people")
        .await
        .unwrap();
    let name = columns.iter().find(|c| c.name == "name").unwrap();
    assert_eq!(name.column_type, ColumnType::Text);
}

#[tokio::test]
async fn test_explicit_duplicate_id_is_a_storage_error() {
    let repo = support::repo();
    support::seed_people(&repo).await;

    let err = repo
        .insert_row(
            support::dataset(),
            "people",
            &support::names(&["id", "name"]),
            &[Value::Int(1), support::text("imposter")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::StorageError { .. }));
}

#[tokio::test]
async fn test_create_table_rejects_bad_schemas() {
    let repo = support::repo();
    support::seed_people(&repo).await;
    let dataset = support::dataset();

    let err = repo
        .create_table(dataset, "people", &[Column::new("x", ColumnType::Text)])
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    // the id column is implicit and cannot be declared
    let err = repo
        .create_table(dataset, "fresh", &[Column::new("id", ColumnType::Integer)])
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let err = repo
        .create_table(
            dataset,
            "fresh",
            &[
                Column::new("a", ColumnType::Text),
                Column::new("a", ColumnType::Integer),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
}

#[tokio::test]
async fn test_get_table_with_unknown_sort_column() {
    let repo = support::repo();
    support::seed_people(&repo).await;

    let query = TableQuery::ordered_by(ColumnOrdering::asc("ghost"));
    let err = repo
        .get_table(support::dataset(), "people", &query)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

// =========================================================
// Operation Tagging
// =========================================================

#[tokio::test]
async fn test_transform_errors_name_their_operation() {
    let repo = support::repo();
    support::seed_people(&repo).await;
    let executor = TransformExecutor::new(repo);

    let err = executor
        .impute_missing_data(support::dataset(), "people", "ghost", ImputeMethod::Mean)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
    assert_eq!(
        err.context().operation.as_deref(),
        Some(IMPUTE_MISSING_DATA)
    );
}

#[tokio::test]
async fn test_dedup_errors_name_their_operation() {
    let repo = support::repo();
    support::seed_contacts(&repo).await;
    let engine = DedupEngine::new(repo);

    let config = DedupConfig::new("ghost", vec![], vec!["name".into()]);
    let err = engine
        .start_run(support::dataset(), "contacts", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
    assert_eq!(err.context().operation.as_deref(), Some(START_DEDUP));
}

// =========================================================
// Factory Configuration
// =========================================================

#[tokio::test]
async fn test_env_variable_selects_the_backend() {
    let picked = support::with_scoped_env(
        &[(REPOSITORY_TYPE_ENV, Some("postgres"))],
        RepositoryType::from_env,
    );
    assert_eq!(picked, RepositoryType::Postgres);
    let err = RepositoryFactory::create(picked).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));

    let picked = support::with_scoped_env(
        &[(REPOSITORY_TYPE_ENV, Some("LOCAL"))],
        RepositoryType::from_env,
    );
    assert_eq!(picked, RepositoryType::Local);

    // malformed values fall back to the local backend
    let picked = support::with_scoped_env(
        &[(REPOSITORY_TYPE_ENV, Some("sqlite"))],
        RepositoryType::from_env,
    );
    assert_eq!(picked, RepositoryType::Local);

    let picked =
        support::with_scoped_env(&[(REPOSITORY_TYPE_ENV, None)], RepositoryType::from_env);
    assert_eq!(picked, RepositoryType::Local);
}

#[tokio::test]
async fn test_config_file_selects_the_backend() {
    let mut local = NamedTempFile::new().unwrap();
    writeln!(local, "[repository]\ntype = \"local\"").unwrap();
    let repo = RepositoryFactory::from_config_file(local.path()).await.unwrap();
    assert!(repo.health_check().await.unwrap());

    let mut postgres = NamedTempFile::new().unwrap();
    writeln!(postgres, "[repository]\ntype = \"postgres\"").unwrap();
    let err = RepositoryFactory::from_config_file(postgres.path())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
}

#[tokio::test]
async fn test_unreadable_or_malformed_config_file() {
    let err = RepositoryFactory::from_config_file("/no/such/place/repository.toml")
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));

    let mut broken = NamedTempFile::new().unwrap();
    writeln!(broken, "this is not toml [").unwrap();
    let err = RepositoryFactory::from_config_file(broken.path())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));

    let mut unknown = NamedTempFile::new().unwrap();
    writeln!(unknown, "[repository]\ntype = \"sqlite\"").unwrap();
    let err = RepositoryFactory::from_config_file(unknown.path())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
}

// =========================================================
// Undo Against a Drifted Table
// =========================================================

#[tokio::test]
async fn test_undo_entry_checks_the_dataset() {
    let repo = support::repo();
    support::seed_people(&repo).await;
    let executor = TransformExecutor::new(repo.clone());

    executor
        .impute_missing_data(support::dataset(), "people", "age", ImputeMethod::Mean)
        .await
        .unwrap();
    let entry = repo
        .last_action(support::dataset(), "people")
        .await
        .unwrap()
        .unwrap();

    let err = executor
        .undo_entry(DatasetId::new(2), entry.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
    assert_eq!(err.context().operation.as_deref(), Some(UNDO_ACTION));

    // the imputed value survives the refused undo
    let table = repo
        .get_table(support::dataset(), "people", &TableQuery::all())
        .await
        .unwrap();
    assert_eq!(support::cell_of(&table, 2, "age"), Value::Int(35));
}

#[tokio::test]
async fn test_reinsert_conflict_surfaces_a_storage_error() {
    let repo = support::repo();
    support::seed_readings(&repo).await;
    let executor = TransformExecutor::new(repo.clone());

    executor
        .remove_outliers(support::dataset(), "readings", "value", 100.0, false)
        .await
        .unwrap();
    // a newcomer claims id 2 before the removal is undone
    repo.insert_row(
        support::dataset(),
        "readings",
        &support::names(&["id", "value"]),
        &[Value::Int(2), Value::Real(61.5)],
    )
    .await
    .unwrap();

    let err = executor
        .undo_last(support::dataset(), "readings")
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::StorageError { .. }));

    // the reinsert is atomic: the other removed row did not come back
    let table = repo
        .get_table(support::dataset(), "readings", &TableQuery::all())
        .await
        .unwrap();
    assert_eq!(support::sorted_ids(&table), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_undo_after_row_deletion_fails_loudly() {
    let repo = support::repo();
    support::seed_people(&repo).await;
    let executor = TransformExecutor::new(repo.clone());

    executor
        .impute_missing_data(support::dataset(), "people", "age", ImputeMethod::Mean)
        .await
        .unwrap();
    repo.delete_rows(support::dataset(), "people", &[2])
        .await
        .unwrap();

    // the filled row is gone, so re-nulling it cannot be replayed
    let err = executor
        .undo_last(support::dataset(), "people")
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::StorageError { .. }));
}
