mod common;

use common::{Event, FakeConnector, POSTGRES_INI, ini_file};
use sql_facade::prelude::*;
use sql_facade::{DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_SECTION, resolve_profile};

#[test]
fn defaults_name_the_conventional_file_and_section() {
    let db = QueryFacade::default();
    assert_eq!(db.config_file(), std::path::Path::new(DEFAULT_CONFIG_FILE));
    assert_eq!(db.config_section(), DEFAULT_CONFIG_SECTION);
}

#[test]
fn section_can_be_switched_between_calls() -> Result<(), FacadeError> {
    let ini = ini_file(POSTGRES_INI);
    let fake = FakeConnector::with_tables(&["people"]);
    let mut db = QueryFacade::with_connector(ini.path(), "database", fake.clone());

    db.select(&SelectRequest::new("people"))?;
    db.set_config_section("legacy");
    assert_eq!(db.config_section(), "legacy");
    db.select(&SelectRequest::new("people"))?;

    let kinds: Vec<DriverKind> = fake
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Connect(kind) => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![DriverKind::Postgres, DriverKind::Odbc]);
    Ok(())
}

#[test]
fn for_section_leaves_the_original_handle_alone() -> Result<(), FacadeError> {
    let ini = ini_file(POSTGRES_INI);
    let fake = FakeConnector::with_tables(&["people"]);
    let db = QueryFacade::with_connector(ini.path(), "database", fake.clone());

    let legacy = db.for_section("legacy");
    legacy.select(&SelectRequest::new("people"))?;
    db.select(&SelectRequest::new("people"))?;

    assert_eq!(db.config_section(), "database");
    assert_eq!(legacy.config_section(), "legacy");
    assert_eq!(fake.events()[0], Event::Connect(DriverKind::Odbc));
    assert_eq!(fake.count(&Event::Connect(DriverKind::Postgres)), 1);
    Ok(())
}

#[test]
fn explicit_backend_beats_host_heuristic() -> Result<(), FacadeError> {
    let ini = ini_file(
        "[database]\nhost = localhost\nbackend = postgres\ndbname = app\n\n[odd]\nhost = postgres-proxy\nbackend = odbc\n",
    );
    let fake = FakeConnector::with_tables(&["people"]);
    let mut db = QueryFacade::with_connector(ini.path(), "database", fake.clone());

    db.select(&SelectRequest::new("people"))?;
    db.set_config_section("odd");
    db.select(&SelectRequest::new("people"))?;

    assert_eq!(fake.events()[0], Event::Connect(DriverKind::Postgres));
    assert!(fake.events().contains(&Event::Connect(DriverKind::Odbc)));
    Ok(())
}

#[test]
fn unknown_section_fails_before_connecting() {
    let ini = ini_file(POSTGRES_INI);
    let fake = FakeConnector::with_tables(&["people"]);
    let db = QueryFacade::with_connector(ini.path(), "nope", fake.clone());

    let err = db.select(&SelectRequest::new("people")).unwrap_err();

    assert!(matches!(err, FacadeError::ConfigSectionNotFound { ref section, .. } if section == "nope"));
    assert!(err.to_string().starts_with("Section nope not found in the "));
    assert!(fake.events().is_empty());
}

#[test]
fn section_without_host_is_a_config_error() {
    let ini = ini_file("[database]\nuser = app\n");
    let fake = FakeConnector::default();

    let err = QueryFacade::with_connector(ini.path(), "database", fake.clone())
        .drop_table(&DropTableRequest::new("people"))
        .unwrap_err();

    assert!(matches!(err, FacadeError::ConfigError(_)));
    assert!(fake.events().is_empty());
}

#[test]
fn missing_config_file_is_reported() {
    let fake = FakeConnector::default();
    let mut db = QueryFacade::with_connector("/no/such/dbconfig.conf", "database", fake.clone());

    assert!(matches!(
        db.select(&SelectRequest::new("people")),
        Err(FacadeError::ConfigSectionNotFound { section, .. }) if section == "database"
    ));
    assert!(fake.events().is_empty());

    let ini = ini_file(POSTGRES_INI);
    db.set_config_file(ini.path());
    fake.lock().tables.insert("people".into());
    assert!(db.select(&SelectRequest::new("people")).is_ok());
}

#[test]
fn profile_keeps_backslashes_and_merges_defaults() -> Result<(), FacadeError> {
    let ini = ini_file(
        "[DEFAULT]\nport = 5432\n\n[database]\nhost = postgres01\npassword = a\\b\\c\n",
    );

    let profile = resolve_profile(ini.path(), "database")?;

    assert_eq!(profile.get("password"), Some("a\\b\\c"));
    assert_eq!(profile.get("port"), Some("5432"));
    assert_eq!(profile.driver_kind()?, DriverKind::Postgres);
    Ok(())
}
