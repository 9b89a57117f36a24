//! Shared fixtures and helpers for the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use dcw_rust::api::DatasetId;
use dcw_rust::db::{FullRepository, RepositoryFactory};
use dcw_rust::models::{parse_timestamp, Column, ColumnType, Table, Value};

/// Every fixture seeds into dataset 1.
pub fn dataset() -> DatasetId {
    DatasetId::new(1)
}

pub fn repo() -> Arc<dyn FullRepository> {
    RepositoryFactory::create_local()
}

// ==================== Value Shorthand ====================

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub fn int(v: i64) -> Value {
    Value::Int(v)
}

pub fn real(v: f64) -> Value {
    Value::Real(v)
}

pub fn ts(raw: &str) -> Value {
    Value::Timestamp(parse_timestamp(raw).expect("fixture timestamp"))
}

pub fn names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

// ==================== Table Fixtures ====================

/// `people(id, name, age)` = [(1, ada, 30), (2, grace, NULL), (3, alan, 40)].
pub async fn seed_people(repo: &Arc<dyn FullRepository>) {
    repo.create_table(
        dataset(),
        "people",
        &[
            Column::new("name", ColumnType::Text),
            Column::new("age", ColumnType::Integer),
        ],
    )
    .await
    .unwrap();
    let rows = vec![
        vec![text("ada"), int(30)],
        vec![text("grace"), Value::Null],
        vec![text("alan"), int(40)],
    ];
    repo.insert_rows(dataset(), "people", &names(&["name", "age"]), &rows)
        .await
        .unwrap();
}

/// `readings(id, value)` real-typed: [(1, 50), (2, 150), (3, 90), (4, 200)].
pub async fn seed_readings(repo: &Arc<dyn FullRepository>) {
    seed_numbers(
        repo,
        "readings",
        &[real(50.0), real(150.0), real(90.0), real(200.0)],
    )
    .await;
}

/// One real column `value` in `table`, one row per entry.
pub async fn seed_numbers(repo: &Arc<dyn FullRepository>, table: &str, values: &[Value]) {
    repo.create_table(dataset(), table, &[Column::new("value", ColumnType::Real)])
        .await
        .unwrap();
    let rows: Vec<Vec<Value>> = values.iter().map(|v| vec![v.clone()]).collect();
    repo.insert_rows(dataset(), table, &names(&["value"]), &rows)
        .await
        .unwrap();
}

/// `signups(id, signup)`: a Thursday, a Sunday, and a NULL.
pub async fn seed_signups(repo: &Arc<dyn FullRepository>) {
    repo.create_table(
        dataset(),
        "signups",
        &[Column::new("signup", ColumnType::Timestamp)],
    )
    .await
    .unwrap();
    let rows = vec![
        vec![ts("2021-03-04 10:30:00")],
        vec![ts("2021-03-07 00:00:00")],
        vec![Value::Null],
    ];
    repo.insert_rows(dataset(), "signups", &names(&["signup"]), &rows)
        .await
        .unwrap();
}

/// `contacts(id, name, email, city)` with two near-duplicate pairs
/// (rows 1/2 and rows 3/4); row 5 matches nothing.
pub async fn seed_contacts(repo: &Arc<dyn FullRepository>) {
    repo.create_table(
        dataset(),
        "contacts",
        &[
            Column::new("name", ColumnType::Text),
            Column::new("email", ColumnType::Text),
            Column::new("city", ColumnType::Text),
        ],
    )
    .await
    .unwrap();
    let rows = vec![
        vec![text("john smith"), text("js@example.com"), text("London")],
        vec![text("jon smith"), text("js@example.com"), text("London")],
        vec![text("mary jane"), text("mj@example.com"), text("Paris")],
        vec![text("mary jane"), text("mj@example.com"), text("Paris")],
        vec![text("bob brown"), text("bb@example.com"), text("Berlin")],
    ];
    repo.insert_rows(dataset(), "contacts", &names(&["name", "email", "city"]), &rows)
        .await
        .unwrap();
}

// ==================== Table Inspection ====================

/// Cells of `column` in row order, cloned out of a fetched table.
pub fn column_of(table: &Table, column: &str) -> Vec<Value> {
    let idx = table.column_index(column).expect("column present");
    table.rows.iter().map(|r| r.values[idx].clone()).collect()
}

/// One cell, addressed by row id and column name.
pub fn cell_of(table: &Table, row_id: i64, column: &str) -> Value {
    let idx = table.column_index(column).expect("column present");
    let row = table
        .rows
        .iter()
        .find(|r| r.id == row_id)
        .expect("row present");
    row.values[idx].clone()
}

/// Row ids of a fetched table, sorted ascending.
pub fn sorted_ids(table: &Table) -> Vec<i64> {
    let mut ids: Vec<i64> = table.rows.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids
}

// ==================== Environment Scoping ====================

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Panic-safe (restores variables on unwind) and serialized across tests,
/// since the process environment is global state.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}
