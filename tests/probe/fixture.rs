//! Fixture setup: drop-if-exists and recreate

use isoprobe::{reset_table, Backend, Connection, Error, IsolationLevel, Statement, TableName};

use crate::common::*;

#[test]
fn reset_on_nonexistent_table_creates_it_empty() {
    let db = plain_db(IsolationLevel::RepeatableRead);
    let table = TableName::default();
    assert!(!db.store().table_exists(&table));

    let mut conn = db.connect().unwrap();
    reset_table(&mut conn, &table).unwrap();

    assert!(db.store().table_exists(&table));
    assert_eq!(probe_rows(&db), 0);
}

#[test]
fn reset_twice_leaves_table_empty_both_times() {
    let db = plain_db(IsolationLevel::RepeatableRead);
    let table = TableName::default();
    let mut conn = db.connect().unwrap();

    reset_table(&mut conn, &table).unwrap();
    conn.execute(&Statement::insert_probe(&table)).unwrap();
    reset_table(&mut conn, &table).unwrap();
    assert_eq!(probe_rows(&db), 0);

    reset_table(&mut conn, &table).unwrap();
    assert_eq!(probe_rows(&db), 0);
}

#[test]
fn reset_discards_rows_of_an_open_transaction() {
    let db = plain_db(IsolationLevel::RepeatableRead);
    let table = TableName::default();
    let mut setup = db.connect().unwrap();
    reset_table(&mut setup, &table).unwrap();

    let mut writer = db.connect().unwrap();
    writer.begin(None).unwrap();
    writer.execute(&Statement::insert_probe(&table)).unwrap();

    reset_table(&mut setup, &table).unwrap();
    drop(writer);
    assert_eq!(probe_rows(&db), 0);
}

#[test]
fn custom_table_name() {
    let db = plain_db(IsolationLevel::RepeatableRead);
    let table = TableName::new("probe_rows").unwrap();
    let mut conn = db.connect().unwrap();
    reset_table(&mut conn, &table).unwrap();
    assert!(db.store().table_exists(&table));
    assert!(matches!(
        TableName::new("1bad"),
        Err(Error::InvalidInput(_))
    ));
}
