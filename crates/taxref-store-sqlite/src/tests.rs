//! Integration tests for `SqliteStore` against an in-memory database.

use taxref_core::{Error as CoreError, Table, Value, store::TableStore};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn statuses() -> Table {
  Table::from_rows(["Région", "CD_REF", "LRR", "sourceId_LRR"], vec![
    vec!["Corse".into(), Value::Int(1234), "VU".into(), Value::Null],
    vec!["Alsace".into(), Value::Int(5678), "Bas-Rhin : EN".into(), "98765".into()],
  ])
  .unwrap()
}

// ─── Tables ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn write_then_read_preserves_columns_rows_and_types() {
  let s = store().await;
  s.write_table("Statuts Flore", &statuses()).await.unwrap();

  let back = s.read_table("Statuts Flore").await.unwrap().unwrap();
  assert_eq!(back, statuses());
}

#[tokio::test]
async fn read_missing_table_returns_none() {
  let s = store().await;
  assert!(s.read_table("Liste Flore").await.unwrap().is_none());
}

#[tokio::test]
async fn write_overwrites_instead_of_appending() {
  let s = store().await;
  s.write_table("Statuts Flore", &statuses()).await.unwrap();

  let narrower = Table::from_rows(["CD_REF", "PR"], vec![vec![
    Value::Int(1),
    "Article 1".into(),
  ]])
  .unwrap();
  s.write_table("Statuts Flore", &narrower).await.unwrap();

  let back = s.read_table("Statuts Flore").await.unwrap().unwrap();
  assert_eq!(back.columns(), ["CD_REF", "PR"]);
  assert_eq!(back.len(), 1);
}

#[tokio::test]
async fn list_tables_is_sorted() {
  let s = store().await;
  s.write_table("Statuts Flore", &statuses()).await.unwrap();
  s.write_table("Liste Flore", &statuses()).await.unwrap();
  s.write_table("Source", &statuses()).await.unwrap();

  let names = s.list_tables().await.unwrap();
  assert_eq!(names, ["Liste Flore", "Source", "Statuts Flore"]);
}

#[tokio::test]
async fn drop_table_reports_existence() {
  let s = store().await;
  s.write_table("Liste Flore", &statuses()).await.unwrap();
  assert!(s.drop_table("Liste Flore").await.unwrap());
  assert!(!s.drop_table("Liste Flore").await.unwrap());
  assert!(s.list_tables().await.unwrap().is_empty());
}

#[tokio::test]
async fn column_names_with_quotes_and_spaces_survive() {
  let s = store().await;
  let table = Table::from_rows(["CD_REF", "LRN - Nicheur", "odd \"name\""], vec![vec![
    Value::Int(1),
    "VU".into(),
    Value::Null,
  ]])
  .unwrap();
  s.write_table("Liste Avifaune", &table).await.unwrap();
  assert_eq!(s.read_table("Liste Avifaune").await.unwrap().unwrap(), table);
}

#[tokio::test]
async fn invalid_names_and_empty_tables_are_refused() {
  let s = store().await;
  assert!(matches!(
    s.write_table("sqlite_sequence", &statuses()).await,
    Err(Error::InvalidTableName(_))
  ));
  assert!(matches!(
    s.write_table("Vide", &Table::default()).await,
    Err(Error::NoColumns(_))
  ));
}

// ─── update_table ────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_table_sees_current_contents_and_writes_result() {
  let s = store().await;

  let created = s
    .update_table("Statuts Flore", |current| {
      assert!(current.is_none());
      Ok(statuses())
    })
    .await
    .unwrap();
  assert_eq!(created.len(), 2);

  s.update_table("Statuts Flore", |current| {
    let mut table = current.expect("table written by the first update");
    table.drop_columns(&["sourceId_LRR"]);
    Ok(table)
  })
  .await
  .unwrap();

  let back = s.read_table("Statuts Flore").await.unwrap().unwrap();
  assert_eq!(back.columns(), ["Région", "CD_REF", "LRR"]);
}

#[tokio::test]
async fn failed_update_leaves_the_table_untouched() {
  let s = store().await;
  s.write_table("Statuts Flore", &statuses()).await.unwrap();

  let err = s
    .update_table("Statuts Flore", |_| Err(CoreError::UnknownColumn("LRR".into())))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UnknownColumn(_))));

  let back = s.read_table("Statuts Flore").await.unwrap().unwrap();
  assert_eq!(back, statuses());
}

#[tokio::test]
async fn concurrent_updates_are_serialized() {
  let s = store().await;
  let counter = Table::from_rows(["n"], vec![vec![Value::Int(0)]]).unwrap();
  s.write_table("Compteur", &counter).await.unwrap();

  let mut handles = Vec::new();
  for _ in 0..16 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.update_table("Compteur", |current| {
        let current = current.expect("counter table");
        let n = current.rows().next().and_then(|r| r.get("n").as_int()).unwrap_or(0);
        Table::from_rows(["n"], vec![vec![Value::Int(n + 1)]])
      })
      .await
      .unwrap();
    }));
  }
  for handle in handles {
    handle.await.unwrap();
  }

  let back = s.read_table("Compteur").await.unwrap().unwrap();
  assert_eq!(back.rows().next().unwrap().get("n"), &Value::Int(16));
}

#[tokio::test]
async fn file_store_persists_across_reopen() {
  let dir = std::env::temp_dir().join(format!("taxref-store-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("statuts.sqlite");

  let s = SqliteStore::open(&path).await.unwrap();
  s.write_table("Liste Flore", &statuses()).await.unwrap();
  s.close().await.unwrap();

  let reopened = SqliteStore::open(&path).await.unwrap();
  assert_eq!(reopened.read_table("Liste Flore").await.unwrap().unwrap(), statuses());
  reopened.close().await.unwrap();
  std::fs::remove_dir_all(&dir).unwrap();
}
