use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::json;
use tracing::Level;

use sql_facade::prelude::*;
use sql_facade::{DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_SECTION};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run one CRUD statement against a configured database")]
struct Args {
    /// INI file holding the connection sections
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Section of the INI file to connect with
    #[arg(long, default_value = DEFAULT_CONFIG_SECTION)]
    section: String,
    /// Log at debug level
    #[arg(long, short)]
    verbose: bool,
    /// Log every statement's SQL at info level
    #[arg(long)]
    show_query: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct FilterArgs {
    /// WHERE text using `?` for each bound value
    #[arg(long = "where")]
    clause: Option<String>,
    /// Value bound to the next `?` of the WHERE text
    #[arg(long = "param")]
    params: Vec<String>,
}

impl FilterArgs {
    fn into_filter(self) -> Option<Filter> {
        self.clause.map(|clause| {
            Filter::new(clause).params(self.params.iter().map(|p| parse_value(p)))
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    Select {
        table: String,
        #[arg(long)]
        columns: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        group_by: Option<String>,
        #[arg(long)]
        order_by: Option<String>,
        #[arg(long)]
        limit: Option<u64>,
    },
    Insert {
        table: String,
        /// `column=value` pairs
        #[arg(required = true, value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },
    Update {
        table: String,
        #[arg(required = true, value_parser = parse_assignment)]
        values: Vec<(String, String)>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    Delete {
        table: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    CreateTable {
        table: String,
        /// `column=type spec` pairs, e.g. `id=serial PRIMARY KEY`
        #[arg(required = true, value_parser = parse_assignment)]
        columns: Vec<(String, String)>,
        #[arg(long)]
        overwrite: bool,
    },
    DropTable {
        table: String,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected column=value, got `{raw}`"))
}

/// Integers, floats, `true`/`false` and `null` keep their type; anything else
/// is text.
fn parse_value(raw: &str) -> RowValues {
    if let Ok(i) = raw.parse::<i64>() {
        RowValues::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        RowValues::Float(f)
    } else if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
        RowValues::Bool(raw.eq_ignore_ascii_case("true"))
    } else if raw.eq_ignore_ascii_case("null") {
        RowValues::Null
    } else {
        RowValues::Text(raw.to_string())
    }
}

fn build_request(command: Command) -> Request {
    match command {
        Command::Select {
            table,
            columns,
            filter,
            group_by,
            order_by,
            limit,
        } => Request::Select(SelectRequest {
            table,
            select: columns,
            filter: filter.into_filter(),
            group_by,
            order_by,
            limit,
        }),
        Command::Insert { table, values } => Request::Insert(
            values
                .iter()
                .fold(InsertRequest::new(table), |req, (c, v)| req.value(c, parse_value(v))),
        ),
        Command::Update {
            table,
            values,
            filter,
        } => Request::Update(values.iter().fold(
            UpdateRequest::new(table, filter.into_filter().unwrap_or_default()),
            |req, (c, v)| req.set(c, parse_value(v)),
        )),
        Command::Delete { table, filter } => Request::Delete(DeleteRequest::new(
            table,
            filter.into_filter().unwrap_or_default(),
        )),
        Command::CreateTable {
            table,
            columns,
            overwrite,
        } => Request::CreateTable(
            columns
                .into_iter()
                .fold(CreateTableRequest::new(table), |req, (c, t)| req.column(c, t))
                .overwrite(overwrite),
        ),
        Command::DropTable { table } => Request::DropTable(DropTableRequest::new(table)),
    }
}

fn render(outcome: &Outcome) -> serde_json::Value {
    match outcome {
        Outcome::Rows(rows) => json!(rows.iter().map(ResultRow::to_json).collect::<Vec<_>>()),
        Outcome::Write(w) => json!(w),
        Outcome::Deleted(n) => json!({ "outcome": "deleted", "rows_affected": n }),
        Outcome::Create(c) => json!({ "outcome": c }),
        Outcome::Drop(d) => json!({ "outcome": d }),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let facade = QueryFacade::new(args.config, args.section).with_show_query(args.show_query);
    let request = build_request(args.command);

    match facade.run(&request) {
        Ok(outcome) => {
            let rendered = render(&outcome);
            println!(
                "{}",
                serde_json::to_string_pretty(&rendered).unwrap_or_else(|_| rendered.to_string())
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
