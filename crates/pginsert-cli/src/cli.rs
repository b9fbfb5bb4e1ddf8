use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Compile,
    Tables,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Compile(CompileArgs),
    Tables(TablesArgs),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileArgs {
    pub config: PathBuf,
    pub type_name: String,
    /// Rows file; `-` reads stdin. `None` inserts one all-default row.
    pub rows: Option<String>,
    pub on_conflict: Option<String>,
    pub set: Vec<String>,
    pub wheres: Vec<String>,
    pub returning: Vec<String>,
    pub table_exprs: Vec<String>,
    pub column_expr: Option<String>,
    pub wrap_with: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TablesArgs {
    pub config: PathBuf,
}

const DEFAULT_CONFIG: &str = "pginsert.toml";

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "compile" => parse_compile(it.map(|s| s.as_str())),
        "tables" => parse_tables(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Read the value of `flag` from `--flag value` or `--flag=value`.
///
/// Returns `None` if `token` is not `flag`.
fn flag_value<'a>(
    flag: &str,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<String>> {
    if token == flag {
        let Some(v) = it.next() else {
            anyhow::bail!("{flag} requires a value");
        };
        return Ok(Some(v.to_string()));
    }
    match token.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
        Some(v) => Ok(Some(v.to_string())),
        None => Ok(None),
    }
}

fn parse_compile<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut args = CompileArgs {
        config: PathBuf::from(DEFAULT_CONFIG),
        type_name: String::new(),
        rows: None,
        on_conflict: None,
        set: Vec::new(),
        wheres: Vec::new(),
        returning: Vec::new(),
        table_exprs: Vec::new(),
        column_expr: None,
        wrap_with: None,
    };
    let mut type_name = None;

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Compile));
        }
        if let Some(v) = flag_value("--config", token, &mut it)? {
            args.config = PathBuf::from(v);
        } else if let Some(v) = flag_value("--type", token, &mut it)? {
            type_name = Some(v);
        } else if let Some(v) = flag_value("--rows", token, &mut it)? {
            args.rows = Some(v);
        } else if let Some(v) = flag_value("--on-conflict", token, &mut it)? {
            args.on_conflict = Some(v);
        } else if let Some(v) = flag_value("--set", token, &mut it)? {
            args.set.push(v);
        } else if let Some(v) = flag_value("--where", token, &mut it)? {
            args.wheres.push(v);
        } else if let Some(v) = flag_value("--returning", token, &mut it)? {
            args.returning.push(v);
        } else if let Some(v) = flag_value("--table-expr", token, &mut it)? {
            args.table_exprs.push(v);
        } else if let Some(v) = flag_value("--column-expr", token, &mut it)? {
            args.column_expr = Some(v);
        } else if let Some(v) = flag_value("--wrap-with", token, &mut it)? {
            args.wrap_with = Some(v);
        } else {
            anyhow::bail!("unknown argument: {token}");
        }
    }

    let Some(type_name) = type_name else {
        anyhow::bail!("compile requires --type <TYPE_NAME>");
    };
    args.type_name = type_name;
    Ok(Command::Compile(args))
}

fn parse_tables<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Tables));
        }
        match flag_value("--config", token, &mut it)? {
            Some(v) => config = PathBuf::from(v),
            None => anyhow::bail!("unknown argument: {token}"),
        }
    }
    Ok(Command::Tables(TablesArgs { config }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
pginsert - compile PostgreSQL INSERT statements from a table catalogue

USAGE:
  pginsert <COMMAND> [OPTIONS]

COMMANDS:
  compile       Compile an INSERT statement for JSON rows
  tables        List catalogue tables and their columns

Run `pginsert <command> --help` for more."
            );
        }
        HelpTopic::Compile => {
            println!(
                "\
USAGE:
  pginsert compile --type <TYPE_NAME> [OPTIONS]

NOTES:
  Rows are a JSON array of objects keyed by field or column name.
  Missing keys are zero and render as DEFAULT where allowed.
  Without --rows a single all-default row is inserted.

OPTIONS:
  --config <FILE>         Catalogue path (default: pginsert.toml)
  --type <TYPE_NAME>      Catalogue table type to insert
  --rows <FILE|->         JSON rows file, or - for stdin
  --on-conflict <TEXT>    ON CONFLICT target and action
  --set <TEXT>            SET fragment for DO UPDATE (repeatable)
  --where <TEXT>          WHERE fragment for DO UPDATE (repeatable)
  --returning <TEXT>      Explicit RETURNING list (repeatable)
  --table-expr <TEXT>     INSERT target; the second one is the CTE source (repeatable)
  --column-expr <TEXT>    Explicit column list
  --wrap-with <NAME>      Insert from a CTE selecting the table's columns
  -h, --help              Print help"
            );
        }
        HelpTopic::Tables => {
            println!(
                "\
USAGE:
  pginsert tables [OPTIONS]

OPTIONS:
  --config <FILE>       Catalogue path (default: pginsert.toml)
  -h, --help            Print help"
            );
        }
    }
}
