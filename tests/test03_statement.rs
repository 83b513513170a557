use sqlite_exec::prelude::*;

fn entries_db() -> Result<Database, SqliteExecError> {
    let db = Database::open_in_memory()?;
    db.exec("CREATE TABLE entries (id INTEGER PRIMARY KEY, name TEXT, score REAL)")?;
    Ok(db)
}

#[test]
fn prepare_failure_carries_engine_diagnostics() -> Result<(), SqliteExecError> {
    let db = entries_db()?;
    let err = db.prepare("SELECT FROM entries WHERE").unwrap_err();
    assert!(matches!(err, SqliteExecError::Sqlite(_)));
    assert!(err.to_string().contains("syntax error"));

    let err = db.prepare("SELECT * FROM no_such_table").unwrap_err();
    assert!(matches!(err, SqliteExecError::Sqlite(_)));
    assert!(err.to_string().contains("no_such_table"));
    Ok(())
}

#[test]
fn run_reports_changes_and_last_insert_rowid() -> Result<(), SqliteExecError> {
    let db = entries_db()?;
    let mut insert = db.prepare("INSERT INTO entries (name, score) VALUES (?, ?)")?;

    let result = insert.run(&Params::positional([Value::from("ada"), Value::Real(9.5)]))?;
    assert_eq!(result.changes, 1);
    assert_eq!(result.last_insert_rowid, 1);

    let result = insert.run(&Params::positional([Value::from("bob"), Value::Real(7.0)]))?;
    assert_eq!(result.last_insert_rowid, 2);

    let mut update = db.prepare("UPDATE entries SET score = score + 1")?;
    let result = update.run(&Params::Empty)?;
    assert_eq!(result.changes, 2);
    Ok(())
}

#[test]
fn reader_and_readonly_flags_reflect_the_statement() -> Result<(), SqliteExecError> {
    let db = entries_db()?;

    let select = db.prepare("SELECT * FROM entries")?;
    assert!(select.reader());
    assert!(select.readonly());

    let insert = db.prepare("INSERT INTO entries (name) VALUES ('x')")?;
    assert!(!insert.reader());
    assert!(!insert.readonly());

    // RETURNING makes a writer produce rows.
    let returning = db.prepare("INSERT INTO entries (name) VALUES ('x') RETURNING id")?;
    assert!(returning.reader());
    assert!(!returning.readonly());

    let begin = db.prepare("BEGIN")?;
    assert!(!begin.reader());
    Ok(())
}

#[test]
fn row_returning_methods_reject_non_readers_before_touching_the_engine()
-> Result<(), SqliteExecError> {
    let db = entries_db()?;
    let mut stmt = db.prepare("INSERT INTO entries (name) VALUES ('x')")?;

    assert!(matches!(
        stmt.get(&Params::Empty),
        Err(SqliteExecError::TypeError(_))
    ));
    assert!(matches!(
        stmt.all(&Params::Empty),
        Err(SqliteExecError::TypeError(_))
    ));
    assert!(stmt.iterate(&Params::Empty).is_err());
    assert!(stmt.iterate_with_lazy_columns(&Params::Empty).is_err());
    assert!(matches!(stmt.columns(), Err(SqliteExecError::TypeError(_))));

    // Nothing was inserted by the rejected calls.
    let mut count = db.prepare("SELECT COUNT(*) FROM entries")?;
    assert_eq!(
        count.get(&Params::Empty)?.unwrap().get(0),
        Some(&Value::Real(0.0))
    );

    // run() stays available on readers and non-readers alike.
    stmt.run(&Params::Empty)?;
    let mut select = db.prepare("SELECT count(*) FROM entries")?;
    select.run(&Params::Empty)?;
    Ok(())
}

#[test]
fn get_reports_absence_as_none() -> Result<(), SqliteExecError> {
    let db = entries_db()?;
    let mut stmt = db.prepare("SELECT * FROM entries WHERE id = ?")?;
    assert!(stmt.get(&Params::positional([Value::Integer(999)]))?.is_none());
    Ok(())
}

#[test]
fn columns_expose_names_and_declared_types_before_execution() -> Result<(), SqliteExecError> {
    let db = entries_db()?;
    let stmt = db.prepare("SELECT id, name, score, id + 1 AS next_id FROM entries")?;

    let columns = stmt.columns()?;
    assert_eq!(columns.len(), 4);
    assert_eq!(columns[0].name, "id");
    assert_eq!(columns[0].decl_type.as_deref(), Some("INTEGER"));
    assert_eq!(columns[1].name, "name");
    assert_eq!(columns[1].decl_type.as_deref(), Some("TEXT"));
    assert_eq!(columns[2].decl_type.as_deref(), Some("REAL"));

    // Computed columns resolve to the alias and carry no declared type.
    assert_eq!(columns[3].name, "next_id");
    assert_eq!(columns[3].decl_type, None);
    Ok(())
}

#[test]
fn named_row_lookup_is_case_sensitive_and_alias_aware() -> Result<(), SqliteExecError> {
    let db = entries_db()?;
    db.exec("INSERT INTO entries (name, score) VALUES ('ada', 1.0)")?;
    let mut stmt = db.prepare("SELECT name AS who FROM entries")?;
    let row = stmt.get(&Params::Empty)?.unwrap();

    assert_eq!(row.get_named("who"), Some(&Value::Text("ada".into())));
    assert_eq!(row.get_named("name"), None);
    assert_eq!(row.get_named("WHO"), None);
    Ok(())
}

#[test]
fn duplicate_column_names_resolve_to_the_last_occurrence() -> Result<(), SqliteExecError> {
    let db = entries_db()?;
    let mut stmt = db.prepare("SELECT 1 AS a, 2 AS a")?;
    let row = stmt.get(&Params::Empty)?.unwrap();
    assert_eq!(row.get_named("a"), Some(&Value::Real(2.0)));
    Ok(())
}

#[test]
fn source_is_preserved_verbatim() -> Result<(), SqliteExecError> {
    let db = entries_db()?;
    let sql = "SELECT id FROM entries -- trailing comment";
    let stmt = db.prepare(sql)?;
    assert_eq!(stmt.source(), sql);
    Ok(())
}

#[test]
fn run_result_serializes_camel_case() -> Result<(), SqliteExecError> {
    let db = entries_db()?;
    let mut insert = db.prepare("INSERT INTO entries (name) VALUES ('x')")?;
    let result = insert.run(&Params::Empty)?;
    let json = serde_json::to_value(result).expect("serializable");
    assert_eq!(json["changes"], 1);
    assert_eq!(json["lastInsertRowid"], 1);
    Ok(())
}

#[test]
fn pragma_and_open_options_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("opts.db");

    {
        let db = Database::open(&path)?;
        db.exec("CREATE TABLE t (x); INSERT INTO t VALUES (1);")?;
        let mode = db.pragma("journal_mode")?;
        assert!(!mode.is_empty());
        db.close()?;
    }

    let err = Database::open_with(
        dir.path().join("missing.db"),
        &OpenOptions::new().file_must_exist(true),
    );
    assert!(err.is_err());

    let db = Database::open_with(&path, &OpenOptions::new().readonly(true))?;
    assert!(db.readonly());
    let err = db.exec("INSERT INTO t VALUES (2)");
    assert!(err.is_err());
    db.close()?;
    Ok(())
}
