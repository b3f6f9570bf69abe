use std::io::ErrorKind;
use std::path::Path;

use ini::{Ini, ParseOption};
use tracing::debug;

use crate::driver::select_driver;
use crate::error::FacadeError;
use crate::types::DriverKind;

/// Key whose value decides the backend when no explicit `backend` is set.
pub const HOST_KEY: &str = "host";
/// Optional explicit backend key, `postgres` or `odbc`.
pub const BACKEND_KEY: &str = "backend";
/// Section whose entries act as fallbacks for every other section.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Flat connection parameters read from one INI section.
///
/// Keys are lower-cased; entries keep the order they were written in, which
/// is also the order of the attributes in an ODBC connection string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionProfile {
    entries: Vec<(String, String)>,
}

impl ConnectionProfile {
    /// Build and validate a profile from key/value pairs.
    ///
    /// # Errors
    /// Returns `FacadeError::ConfigError` if the profile names an unknown backend
    /// or has neither a `backend` nor a `host` entry.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, FacadeError>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut profile = Self::default();
        for (key, value) in pairs {
            profile.insert(key.into(), value.into());
        }
        select_driver(&profile)?;
        Ok(profile)
    }

    fn insert(&mut self, key: String, value: String) {
        let key = key.to_lowercase();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Value for `key`, matched case-insensitively.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.get(HOST_KEY)
    }

    /// Backend this profile dispatches to.
    ///
    /// # Errors
    /// Same conditions as [`select_driver`].
    pub fn driver_kind(&self) -> Result<DriverKind, FacadeError> {
        select_driver(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read `section` of the INI file at `path` into a profile.
///
/// # Errors
/// Returns `FacadeError::ConfigSectionNotFound` if the file or the section
/// is absent, `FacadeError::IniError` if the file cannot be read or parsed, and
/// `FacadeError::ConfigError` if the section fails profile validation.
pub fn resolve_profile(path: &Path, section: &str) -> Result<ConnectionProfile, FacadeError> {
    let ini = match Ini::load_from_file_opt(path, parse_options()) {
        Ok(ini) => ini,
        // no file means no section either
        Err(ini::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found");
            return Err(FacadeError::ConfigSectionNotFound {
                section: section.to_string(),
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    profile_from_ini(&ini, path, section)
}

/// Same as [`resolve_profile`] for INI text already in memory.
///
/// # Errors
/// See [`resolve_profile`].
pub fn resolve_profile_from_str(text: &str, section: &str) -> Result<ConnectionProfile, FacadeError> {
    let ini = Ini::load_from_str_opt(text, parse_options()).map_err(ini::Error::Parse)?;
    profile_from_ini(&ini, Path::new("<inline>"), section)
}

// Backslashes in passwords and ODBC paths are literal.
fn parse_options() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    }
}

fn profile_from_ini(ini: &Ini, path: &Path, section: &str) -> Result<ConnectionProfile, FacadeError> {
    let Some(props) = ini.section(Some(section)) else {
        return Err(FacadeError::ConfigSectionNotFound {
            section: section.to_string(),
            path: path.to_path_buf(),
        });
    };

    let mut profile = ConnectionProfile::default();
    if section != DEFAULT_SECTION {
        if let Some(defaults) = ini.section(Some(DEFAULT_SECTION)) {
            for (key, value) in defaults.iter() {
                profile.insert(key.to_string(), value.to_string());
            }
        }
    }
    for (key, value) in props.iter() {
        profile.insert(key.to_string(), value.to_string());
    }

    let kind = select_driver(&profile)?;
    debug!(
        section,
        path = %path.display(),
        keys = profile.len(),
        %kind,
        "resolved connection profile"
    );
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[DEFAULT]
port = 5432
user = fallback

[warehouse]
Host = db-postgres.internal
User = reporter
password = secret
database = sales

[legacy]
host = mssql01
driver = {ODBC Driver 18 for SQL Server}
";

    #[test]
    fn reads_section_with_lowercased_keys_and_defaults() {
        let profile = resolve_profile_from_str(SAMPLE, "warehouse").unwrap();
        assert_eq!(profile.host(), Some("db-postgres.internal"));
        assert_eq!(profile.get("USER"), Some("reporter"));
        assert_eq!(profile.get("port"), Some("5432"));
        assert_eq!(profile.driver_kind().unwrap(), DriverKind::Postgres);
    }

    #[test]
    fn section_order_is_preserved() {
        let profile = resolve_profile_from_str(SAMPLE, "legacy").unwrap();
        let keys: Vec<&str> = profile.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["port", "user", "host", "driver"]);
        assert_eq!(profile.driver_kind().unwrap(), DriverKind::Odbc);
    }

    #[test]
    fn missing_section_is_named_in_error() {
        let err = resolve_profile_from_str(SAMPLE, "nope").unwrap_err();
        match err {
            FacadeError::ConfigSectionNotFound { section, .. } => assert_eq!(section, "nope"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn profile_without_host_or_backend_is_rejected() {
        let err = ConnectionProfile::from_pairs([("user", "x")]).unwrap_err();
        assert!(matches!(err, FacadeError::ConfigError(_)));
    }

    #[test]
    fn missing_file_reports_the_section() {
        let err = resolve_profile(Path::new("/definitely/not/here.conf"), "x").unwrap_err();
        assert!(matches!(
            &err,
            FacadeError::ConfigSectionNotFound { section, path }
                if section == "x" && path == Path::new("/definitely/not/here.conf")
        ));
        assert_eq!(
            err.to_string(),
            "Section x not found in the /definitely/not/here.conf file"
        );
    }

    #[test]
    fn unreadable_config_is_an_ini_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_profile(dir.path(), "x").unwrap_err();
        assert!(matches!(err, FacadeError::IniError(_)));
    }
}
