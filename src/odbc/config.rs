use crate::config::{BACKEND_KEY, ConnectionProfile};

/// Build an ODBC connection string from every profile entry.
///
/// `host`, `user` and `password` are renamed to the attribute names driver
/// managers expect (`server`, `uid`, `pwd`). Values that would break the
/// `key=value;` grammar are wrapped in braces.
#[must_use]
pub fn connection_string(profile: &ConnectionProfile) -> String {
    let mut out = String::new();
    for (key, value) in profile.iter() {
        let attribute = match key {
            BACKEND_KEY => continue,
            "host" => "server",
            "user" => "uid",
            "password" => "pwd",
            other => other,
        };
        out.push_str(attribute);
        out.push('=');
        out.push_str(&quote_value(value));
        out.push(';');
    }
    out
}

fn quote_value(value: &str) -> String {
    let already_braced = value.starts_with('{') && value.ends_with('}');
    let needs_braces = value.contains([';', '{', '}'])
        || value.starts_with(' ')
        || value.ends_with(' ');
    if already_braced || !needs_braces {
        value.to_string()
    } else {
        format!("{{{}}}", value.replace('}', "}}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_and_orders_attributes() {
        let profile = ConnectionProfile::from_pairs([
            ("driver", "{ODBC Driver 18 for SQL Server}"),
            ("host", "mssql01"),
            ("database", "sales"),
            ("user", "app"),
            ("password", "p;w}d"),
            ("backend", "odbc"),
        ])
        .unwrap();
        assert_eq!(
            connection_string(&profile),
            "driver={ODBC Driver 18 for SQL Server};server=mssql01;database=sales;uid=app;pwd={p;w}}d};"
        );
    }
}
