#![cfg(feature = "test-utils-postgres")]

use std::io::Write;

use chrono::NaiveDate;

use postgresql_embedded::PostgreSQL;
use sql_facade::prelude::*;
use tempfile::NamedTempFile;

#[test]
fn round_trip_against_embedded_postgres() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let postgresql = rt.block_on(async {
        let mut postgresql = PostgreSQL::default();
        postgresql.setup().await?;
        postgresql.start().await?;
        postgresql.create_database("facade_test").await?;
        Ok::<_, postgresql_embedded::Error>(postgresql)
    })?;

    let settings = postgresql.settings();
    let mut ini = NamedTempFile::new()?;
    write!(
        ini,
        "[database]\nbackend = postgres\nhost = {}\nport = {}\nuser = {}\npassword = {}\ndbname = facade_test\n",
        settings.host, settings.port, settings.username, settings.password
    )?;
    ini.flush()?;

    let db = QueryFacade::new(ini.path(), "database").with_show_query(true);

    let created = db.create_table(
        &CreateTableRequest::new("people")
            .column("id", "serial PRIMARY KEY")
            .column("name", "char(10)")
            .column("age", "integer")
            .column("score", "double precision"),
    )?;
    assert_eq!(created, CreateOutcome::Created);
    assert_eq!(
        db.create_table(&CreateTableRequest::new("people").column("id", "integer"))?,
        CreateOutcome::AlreadyExists
    );

    for (name, age) in [("Ann", 3), ("Bo", 40), ("O'Neil", 12)] {
        let written = db.insert(
            &InsertRequest::new("people")
                .value("name", name)
                .value("age", age)
                .value("score", 1.5),
        )?;
        assert_eq!(written.rows_affected(), 1);
    }

    let rows = db.select(
        &SelectRequest::new("people")
            .columns("name, age")
            .filter(Filter::new("age < ?").param(20))
            .order_by("age DESC"),
    )?;
    assert_eq!(rows.len(), 2);
    // char(10) pads; values come back trimmed
    assert_eq!(rows[0].get("name").and_then(RowValues::as_text), Some("O'Neil"));
    assert_eq!(rows[1].get("age"), Some(&RowValues::Int(3)));

    let updated = db.update(&UpdateRequest::new("people", Filter::new("name = ?").param("Bo")).set("age", 41))?;
    assert_eq!(updated.rows_affected(), 1);

    assert_eq!(db.delete(&DeleteRequest::new("people", Filter::new("age > ?").param(40)))?, 1);
    assert_eq!(db.select(&SelectRequest::new("people"))?.len(), 2);

    assert_eq!(
        db.update(&UpdateRequest::new("ghost", "id = 1").set("age", 1))?,
        WriteOutcome::TableMissing
    );
    assert!(matches!(
        db.delete(&DeleteRequest::new("ghost", "id = 1")),
        Err(FacadeError::TableNotFound(_))
    ));

    assert_eq!(db.drop_table(&DropTableRequest::new("people"))?, DropOutcome::Dropped);
    assert_eq!(db.drop_table(&DropTableRequest::new("people"))?, DropOutcome::Missing);

    mismatched_literals_round_trip(&db)?;

    rt.block_on(postgresql.stop())?;
    Ok(())
}

// values whose Rust type differs from the column type are converted, not
// written as raw bytes
fn mismatched_literals_round_trip(db: &QueryFacade) -> Result<(), FacadeError> {
    db.create_table(
        &CreateTableRequest::new("items")
            .column("qty", "integer")
            .column("label", "varchar(20)")
            .column("price", "numeric(10,2)")
            .column("born", "date")
            .column("note", "text DEFAULT 'a;b -- c'"),
    )?;
    db.insert(
        &InsertRequest::new("items")
            .value("qty", "1234")
            .value("label", 3)
            .value("price", 2.5)
            .value("born", "2024-01-02"),
    )?;
    db.insert(
        &InsertRequest::new("items")
            .value("qty", 6)
            .value("label", true)
            .value("price", "7.50")
            .value("born", "2024-03-04 10:00:00"),
    )?;

    let rows = db.select(
        &SelectRequest::new("items")
            .columns("qty, label, price, born, note")
            .filter(Filter::new("qty = ?").param("1234")),
    )?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("qty"), Some(&RowValues::Int(1234)));
    assert_eq!(rows[0].get("label"), Some(&RowValues::Text("3".into())));
    assert_eq!(rows[0].get("price"), Some(&RowValues::Float(2.5)));
    assert_eq!(
        rows[0].get("born").and_then(RowValues::as_timestamp),
        NaiveDate::from_ymd_opt(2024, 1, 2).and_then(|d| d.and_hms_opt(0, 0, 0))
    );
    assert_eq!(rows[0].get("note").and_then(RowValues::as_text), Some("a;b -- c"));

    let rows = db.select(
        &SelectRequest::new("items")
            .columns("label, CAST(price AS text) AS price_text")
            .filter(Filter::new("qty = ?").param(6.0)),
    )?;
    assert_eq!(rows[0].get("label").and_then(RowValues::as_text), Some("true"));
    assert_eq!(rows[0].get("price_text").and_then(RowValues::as_text), Some("7.50"));

    let totals = db.select(
        &SelectRequest::new("items")
            .columns("sum(qty) AS total, avg(qty), avg(qty)::float8 AS mean, sum(price) AS spend"),
    )?;
    assert_eq!(totals[0].get("total"), Some(&RowValues::Int(1240)));
    assert_eq!(totals[0].get("avg"), Some(&RowValues::Float(620.0)));
    assert_eq!(totals[0].get("mean"), Some(&RowValues::Float(620.0)));
    assert_eq!(totals[0].get("spend"), Some(&RowValues::Float(10.0)));

    assert!(matches!(
        db.insert(&InsertRequest::new("items").value("qty", "lots")),
        Err(FacadeError::PostgresError(_))
    ));

    assert_eq!(db.drop_table(&DropTableRequest::new("items"))?, DropOutcome::Dropped);
    Ok(())
}
