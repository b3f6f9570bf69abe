//! Allow-list checks for the parts of a statement that cannot be bound as
//! parameters: table and column names, select lists, grouping and ordering
//! fragments, and column type specs.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FacadeError;
use crate::translation::scan_placeholders;

const COLUMN_REF: &str = r"[a-z_][a-z0-9_]*(?:\.[a-z_][a-z0-9_]*)?";
const CALL: &str =
    r"[a-z_][a-z0-9_]*\(\s*(?:\*|(?:distinct\s+)?[a-z_][a-z0-9_]*(?:\.[a-z_][a-z0-9_]*)?)\s*\)";
const TYPE_NAME: &str =
    r"[a-z_][a-z0-9_]*(?:\s+precision)?(?:\(\s*\d+\s*(?:,\s*\d+\s*)?\))?";

lazy_static! {
    static ref IDENT: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    // column, `t.*`, one-argument call or `CAST(<column|call> AS <type>)`,
    // each optionally followed by `::<type>` and an alias
    static ref SELECT_ITEM: Regex = Regex::new(&format!(
        r"(?ix)^
        (?:
            \*
          | (?:
                {column}(?:\.\*)?
              | {call}
              | cast\(\s* (?:{column}|{call}) \s+as\s+ {ty} \s*\)
            )
            (?:::{ty})?
        )
        (?:\s+(?:as\s+)?[a-z_][a-z0-9_]*)?
        $",
        column = COLUMN_REF,
        call = CALL,
        ty = TYPE_NAME,
    ))
    .unwrap();
    static ref GROUP_ITEM: Regex =
        Regex::new(r"(?i)^[a-z_][a-z0-9_]*(?:\.[a-z_][a-z0-9_]*)?$").unwrap();
    static ref ORDER_ITEM: Regex = Regex::new(
        r"(?i)^[a-z_][a-z0-9_]*(?:\.[a-z_][a-z0-9_]*)?(?:\s+(?:asc|desc))?(?:\s+nulls\s+(?:first|last))?$"
    )
    .unwrap();
}

/// A validated, optionally schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    /// Parse `table` or `schema.table`.
    ///
    /// # Errors
    /// Returns `FacadeError::InvalidIdentifier` if either part is not a plain identifier.
    pub fn parse(raw: &str) -> Result<Self, FacadeError> {
        let raw = raw.trim();
        let (schema, table) = match raw.split_once('.') {
            Some((schema, table)) => (Some(schema), table),
            None => (None, raw),
        };
        if let Some(schema) = schema {
            check_ident(schema, "schema")?;
        }
        check_ident(table, "table")?;
        Ok(Self {
            schema: schema.map(str::to_string),
            table: table.to_string(),
        })
    }

    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// Validate a single column name.
///
/// # Errors
/// Returns `FacadeError::InvalidIdentifier` when the name is not a plain identifier.
pub fn column_name(raw: &str) -> Result<&str, FacadeError> {
    let name = raw.trim();
    check_ident(name, "column")?;
    Ok(name)
}

/// Validate a select list such as `name, count(*) AS n`.
///
/// # Errors
/// Returns `FacadeError::InvalidIdentifier` for any item outside the allow-list.
pub fn select_list(raw: &str) -> Result<String, FacadeError> {
    comma_list(raw, &SELECT_ITEM, "select item")
}

/// Validate a GROUP BY column list.
///
/// # Errors
/// Returns `FacadeError::InvalidIdentifier` for anything but column references.
pub fn group_by_list(raw: &str) -> Result<String, FacadeError> {
    comma_list(raw, &GROUP_ITEM, "group by item")
}

/// Validate an ORDER BY list such as `name ASC, age DESC NULLS LAST`.
///
/// # Errors
/// Returns `FacadeError::InvalidIdentifier` for anything but column references with a direction.
pub fn order_by_list(raw: &str) -> Result<String, FacadeError> {
    comma_list(raw, &ORDER_ITEM, "order by item")
}

/// Check a column definition like `timestamp default now() NOT NULL`.
///
/// Type specs are free text; statement terminators, comments and unclosed
/// quotes outside string literals are refused, so `DEFAULT 'a;b'` is fine.
///
/// # Errors
/// Returns `FacadeError::InvalidIdentifier` if the type spec is empty or could smuggle a second statement.
pub fn column_type_spec(raw: &str) -> Result<&str, FacadeError> {
    let spec = raw.trim();
    if spec.is_empty() {
        return Err(FacadeError::InvalidIdentifier(
            "column type spec is empty".to_string(),
        ));
    }
    let scan = scan_placeholders(spec);
    if scan.terminator || scan.comment || scan.unclosed {
        return Err(FacadeError::InvalidIdentifier(format!(
            "column type spec `{spec}` contains a terminator, comment or unclosed quote"
        )));
    }
    Ok(spec)
}

/// Refuse a free-form WHERE clause that terminates the statement, or hides
/// the rest of it behind a comment or an unclosed quote.
///
/// # Errors
/// Returns `FacadeError::InvalidIdentifier` when a `;` or comment appears
/// outside literals, or a quote is left open.
pub fn filter_clause(raw: &str) -> Result<&str, FacadeError> {
    let clause = raw.trim();
    if clause.is_empty() {
        return Err(FacadeError::InvalidIdentifier(
            "filter clause is empty".to_string(),
        ));
    }
    let scan = scan_placeholders(clause);
    if scan.terminator || scan.comment || scan.unclosed {
        return Err(FacadeError::InvalidIdentifier(format!(
            "filter `{clause}` contains a statement terminator, comment or unclosed quote"
        )));
    }
    Ok(clause)
}

fn check_ident(name: &str, what: &str) -> Result<(), FacadeError> {
    if IDENT.is_match(name) {
        Ok(())
    } else {
        Err(FacadeError::InvalidIdentifier(format!(
            "{what} name `{name}`"
        )))
    }
}

fn comma_list(raw: &str, item: &Regex, what: &str) -> Result<String, FacadeError> {
    let mut items = Vec::new();
    for part in split_top_level(raw) {
        let part = part.trim();
        if !item.is_match(part) {
            return Err(FacadeError::InvalidIdentifier(format!("{what} `{part}`")));
        }
        items.push(part);
    }
    Ok(items.join(", "))
}

/// Split on commas that are not inside parentheses, so `numeric(10,2)`
/// stays one item.
fn split_top_level(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&raw[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_qualified_tables() {
        let plain = TableName::parse("Users").unwrap();
        assert_eq!(plain.table(), "Users");
        assert_eq!(plain.schema(), None);

        let qualified = TableName::parse("public.users").unwrap();
        assert_eq!(qualified.schema(), Some("public"));
        assert_eq!(qualified.to_string(), "public.users");
    }

    #[test]
    fn rejects_injection_in_table_names() {
        for bad in ["users; DROP TABLE x", "a.b.c", "1abc", "", "us ers", "t--"] {
            assert!(
                matches!(TableName::parse(bad), Err(FacadeError::InvalidIdentifier(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn select_list_allows_columns_aggregates_and_aliases() {
        assert_eq!(select_list("*").unwrap(), "*");
        assert_eq!(
            select_list("name,age AS years , count(*) n, t.*").unwrap(),
            "name, age AS years, count(*) n, t.*"
        );
        assert!(select_list("count(DISTINCT city)").is_ok());
        assert!(select_list("name; DROP TABLE t").is_err());
        assert!(select_list("(select 1)").is_err());
        assert!(select_list("").is_err());
    }

    #[test]
    fn select_list_allows_casts() {
        assert_eq!(
            select_list("avg(age)::float8 AS mean, CAST(price AS numeric(10,2)) p").unwrap(),
            "avg(age)::float8 AS mean, CAST(price AS numeric(10,2)) p"
        );
        assert!(select_list("price::double precision").is_ok());
        assert!(select_list("CAST(sum(qty) AS text)").is_ok());
        assert!(select_list("CAST(price AS text); DROP TABLE t").is_err());
        assert!(select_list("CAST((select 1) AS int)").is_err());
        assert!(select_list("price::text(").is_err());
    }

    #[test]
    fn order_and_group_lists() {
        assert_eq!(
            order_by_list("name asc,age DESC NULLS LAST").unwrap(),
            "name asc, age DESC NULLS LAST"
        );
        assert!(order_by_list("name sideways").is_err());
        assert_eq!(group_by_list("city, t.kind").unwrap(), "city, t.kind");
        assert!(group_by_list("count(*)").is_err());
    }

    #[test]
    fn type_specs_and_filters() {
        assert!(
            column_type_spec("timestamp default timezone('UTC'::text, CURRENT_TIMESTAMP) NOT NULL")
                .is_ok()
        );
        assert!(column_type_spec("int; DROP TABLE t").is_err());
        assert!(column_type_spec("int -- x").is_err());
        assert!(column_type_spec("varchar(10) DEFAULT 'a;b'").is_ok());
        assert!(column_type_spec("text DEFAULT '-- not a comment'").is_ok());
        assert!(column_type_spec("text DEFAULT 'open").is_err());
        assert!(filter_clause("name = ? AND note = 'a;b'").is_ok());
        assert!(filter_clause("1 = 1; DELETE FROM t").is_err());
        assert!(filter_clause("id = 1 -- AND owner = ?").is_err());
        assert!(filter_clause("note = 'it''s").is_err());
        assert!(filter_clause("  ").is_err());
    }
}
