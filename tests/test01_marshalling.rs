use sqlite_exec::prelude::*;

fn value_table() -> Result<Database, SqliteExecError> {
    let db = Database::open_in_memory()?;
    db.exec("CREATE TABLE vals (v)")?;
    Ok(db)
}

fn insert_and_read(db: &Database, value: Value, safe_integers: bool) -> Result<Value, SqliteExecError> {
    db.prepare("DELETE FROM vals")?.run(&Params::Empty)?;
    db.prepare("INSERT INTO vals (v) VALUES (?)")?
        .run(&Params::Positional(vec![value]))?;
    let mut stmt = db.prepare("SELECT v FROM vals")?;
    stmt.safe_integers(safe_integers);
    let row = stmt.get(&Params::Empty)?.expect("row present");
    Ok(row.get(0).cloned().expect("column present"))
}

#[test]
fn doubles_round_trip_without_safe_integer_mode() -> Result<(), SqliteExecError> {
    let db = value_table()?;
    for v in [0.0, -1.5, 3.141592653589793, f64::MAX, f64::MIN_POSITIVE] {
        assert_eq!(insert_and_read(&db, Value::Real(v), false)?, Value::Real(v));
    }
    Ok(())
}

#[test]
fn safe_range_integers_round_trip_as_doubles_without_safe_integer_mode()
-> Result<(), SqliteExecError> {
    let db = value_table()?;
    for v in [0i64, 1, -1, 42, 9_007_199_254_740_991, -9_007_199_254_740_991] {
        assert_eq!(
            insert_and_read(&db, Value::Integer(v), false)?,
            Value::Real(v as f64)
        );
    }
    Ok(())
}

#[test]
fn large_integers_round_trip_exactly_in_safe_integer_mode() -> Result<(), SqliteExecError> {
    let db = value_table()?;
    let big = 9_007_199_254_740_993i64; // 2^53 + 1: not representable as f64
    assert_eq!(
        insert_and_read(&db, Value::Integer(big), true)?,
        Value::Integer(big)
    );

    // Without the mode the readback is the double approximation.
    let narrowed = insert_and_read(&db, Value::Integer(big), false)?;
    assert_eq!(narrowed, Value::Real(big as f64));
    Ok(())
}

#[test]
fn binding_is_full_precision_regardless_of_read_mode() -> Result<(), SqliteExecError> {
    let db = value_table()?;
    let big = i64::MAX - 1;
    // Bound with the read-side mode off, read back with it on: exact.
    db.prepare("INSERT INTO vals (v) VALUES (?)")?
        .run(&Params::Positional(vec![Value::Integer(big)]))?;
    let mut stmt = db.prepare("SELECT v FROM vals")?;
    stmt.safe_integers(true);
    let row = stmt.get(&Params::Empty)?.expect("row present");
    assert_eq!(row.get(0), Some(&Value::Integer(big)));
    Ok(())
}

#[test]
fn text_blob_and_null_round_trip() -> Result<(), SqliteExecError> {
    let db = value_table()?;
    assert_eq!(
        insert_and_read(&db, Value::Text("hëllo".into()), false)?,
        Value::Text("hëllo".into())
    );
    assert_eq!(
        insert_and_read(&db, Value::Blob(vec![0xdd; 4]), false)?,
        Value::Blob(vec![0xdd; 4])
    );
    assert_eq!(insert_and_read(&db, Value::Null, false)?, Value::Null);
    Ok(())
}

#[test]
fn materialized_blobs_outlive_the_cursor() -> Result<(), SqliteExecError> {
    let db = value_table()?;
    db.prepare("INSERT INTO vals (v) VALUES (x'deadbeef'), (x'cafe')")?
        .run(&Params::Empty)?;
    let mut stmt = db.prepare("SELECT v FROM vals ORDER BY rowid")?;
    let rows = stmt.all(&Params::Empty)?;
    // The statement's cursor is long closed; the copies must be intact.
    drop(stmt);
    assert_eq!(rows[0].get(0), Some(&Value::Blob(vec![0xde, 0xad, 0xbe, 0xef])));
    assert_eq!(rows[1].get(0), Some(&Value::Blob(vec![0xca, 0xfe])));
    Ok(())
}

#[test]
fn host_conveniences_convert_through_the_marshaller() -> Result<(), SqliteExecError> {
    let db = value_table()?;

    // bool binds as INTEGER 0/1.
    let read = insert_and_read(&db, Value::from(true), true)?;
    assert_eq!(read, Value::Integer(1));
    assert_eq!(read.as_bool(), Some(true));

    // Timestamps bind as formatted TEXT and parse back.
    let dt = chrono::NaiveDateTime::parse_from_str("2024-03-01 12:30:45", "%Y-%m-%d %H:%M:%S")
        .expect("valid timestamp");
    let read = insert_and_read(&db, Value::from(dt), false)?;
    assert_eq!(read.as_timestamp(), Some(dt));

    // JSON composites serialize to TEXT through the explicit helper.
    let json = serde_json::json!({"k": [1, 2]});
    let read = insert_and_read(&db, Value::json(&json), false)?;
    assert_eq!(read.as_text(), Some(r#"{"k":[1,2]}"#));
    Ok(())
}

#[test]
fn unsupported_host_types_are_rejected_with_the_offending_type_named() {
    let arr = serde_json::json!([1, 2, 3]);
    let err = Value::try_from(&arr).unwrap_err();
    assert!(matches!(err, SqliteExecError::TypeError(_)));
    assert!(err.to_string().contains("array"));

    let obj = serde_json::json!({"a": 1});
    let err = Value::try_from(&obj).unwrap_err();
    assert!(err.to_string().contains("object"));

    let err = Value::try_from(u64::MAX).unwrap_err();
    assert!(matches!(err, SqliteExecError::TypeError(_)));
}

#[test]
fn safe_integer_default_is_inherited_at_prepare_time() -> Result<(), SqliteExecError> {
    let db = value_table()?;
    db.prepare("INSERT INTO vals (v) VALUES (7)")?
        .run(&Params::Empty)?;

    db.default_safe_integers(true);
    let mut inheriting = db.prepare("SELECT v FROM vals")?;
    assert_eq!(
        inheriting.get(&Params::Empty)?.unwrap().get(0),
        Some(&Value::Integer(7))
    );

    // Existing statements keep their own setting; new ones follow the default.
    db.default_safe_integers(false);
    assert_eq!(
        inheriting.get(&Params::Empty)?.unwrap().get(0),
        Some(&Value::Integer(7))
    );
    Ok(())
}
