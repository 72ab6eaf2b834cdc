use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Build(StatementKind),
    Infer,
}

/// Statement a payload is turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::CreateTable => "create-table",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "select" => Some(Self::Select),
            "insert" => Some(Self::Insert),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "create-table" => Some(Self::CreateTable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Build(BuildArgs),
    Infer(InferArgs),
}

#[derive(Debug, Clone)]
pub struct BuildArgs {
    pub kind: StatementKind,
    pub common: CommonArgs,
    /// Insert only: one bulk statement instead of one per row.
    pub multi_row: bool,
}

#[derive(Debug, Clone)]
pub struct InferArgs {
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Default)]
pub struct CommonArgs {
    pub config: Option<PathBuf>,
    pub dialect: Option<String>,
    /// `None` reads stdin.
    pub payload: Option<PathBuf>,
    pub log_sql: bool,
    pub pretty: bool,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1).map(|s| s.as_str());
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "infer" => {
            let Some(common) = parse_common(it)? else {
                return Ok(Command::Help(HelpTopic::Infer));
            };
            // Inference reads no builder settings.
            let unused = [
                ("--config", common.config.is_some()),
                ("--dialect", common.dialect.is_some()),
                ("--log-sql", common.log_sql),
            ];
            if let Some((flag, _)) = unused.iter().find(|(_, set)| *set) {
                anyhow::bail!("{flag} is not accepted by infer");
            }
            Ok(Command::Infer(InferArgs { common }))
        }
        other => {
            let Some(kind) = StatementKind::parse(other) else {
                anyhow::bail!("unknown command: {other}");
            };
            let mut multi_row = false;
            let rest: Vec<&str> = it
                .filter(|token| {
                    let hit = kind == StatementKind::Insert && *token == "--multi-row";
                    multi_row |= hit;
                    !hit
                })
                .collect();
            let Some(common) = parse_common(rest.into_iter())? else {
                return Ok(Command::Help(HelpTopic::Build(kind)));
            };
            Ok(Command::Build(BuildArgs {
                kind,
                common,
                multi_row,
            }))
        }
    }
}

/// Parse the options shared by every command. `None` means help was asked for.
fn parse_common<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Option<CommonArgs>> {
    let mut args = CommonArgs::default();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(None),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                args.config = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--config=") => {
                args.config = Some(PathBuf::from(token.trim_start_matches("--config=")));
            }
            "--dialect" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--dialect requires a value");
                };
                args.dialect = Some(v.to_string());
            }
            _ if token.starts_with("--dialect=") => {
                args.dialect = Some(token.trim_start_matches("--dialect=").to_string());
            }
            "--payload" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--payload requires a value");
                };
                args.payload = (v != "-").then(|| PathBuf::from(v));
            }
            _ if token.starts_with("--payload=") => {
                let v = token.trim_start_matches("--payload=");
                args.payload = (v != "-").then(|| PathBuf::from(v));
            }
            "--log-sql" => args.log_sql = true,
            "--pretty" => args.pretty = true,
            _ => anyhow::bail!("unknown argument: {token}"),
        }
    }

    Ok(Some(args))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
sqlweave - parameterized SQL from JSON payloads

USAGE:
  sqlweave <COMMAND> [OPTIONS]

COMMANDS:
  select                Build a SELECT
  insert                Build INSERT statements
  update                Build an UPDATE
  delete                Build a DELETE
  create-table          Build a CREATE TABLE
  infer                 Infer column types of JSON records

Run `sqlweave <command> --help` for more."
            );
        }
        HelpTopic::Build(kind) => {
            let extra = if kind == StatementKind::Insert {
                "\n  --multi-row           One bulk statement for rows targeting one table"
            } else {
                ""
            };
            println!(
                "\
USAGE:
  sqlweave {} [OPTIONS]

OPTIONS:
  --config <FILE>       Config file with a [builder] table
  --dialect <NAME>      oracle, mssql, mysql, postgresql or sqlite (overrides config)
  --payload <FILE>      JSON payload path, `-` for stdin (default: stdin)
  --log-sql             Log built statements to stderr
  --pretty              Pretty-print the JSON output{extra}
  -h, --help            Print help

ENVIRONMENT:
  SQLWEAVE_LOG          Log filter (default: warn)",
                kind.as_str()
            );
        }
        HelpTopic::Infer => {
            println!(
                "\
USAGE:
  sqlweave infer [OPTIONS]

NOTES:
  Reads a JSON array of records and prints the cast records, the inferred
  column types and any coercion warnings.

OPTIONS:
  --payload <FILE>      JSON records path, `-` for stdin (default: stdin)
  --pretty              Pretty-print the JSON output
  -h, --help            Print help"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_select_with_options() {
        let cmd = parse_args(&args(&[
            "sqlweave",
            "select",
            "--config",
            "weave.toml",
            "--dialect=mysql",
            "--payload",
            "q.json",
            "--pretty",
        ]))
        .unwrap();
        let Command::Build(b) = cmd else {
            panic!("expected build");
        };
        assert_eq!(b.kind, StatementKind::Select);
        assert_eq!(b.common.config, Some(PathBuf::from("weave.toml")));
        assert_eq!(b.common.dialect.as_deref(), Some("mysql"));
        assert_eq!(b.common.payload, Some(PathBuf::from("q.json")));
        assert!(b.common.pretty);
        assert!(!b.multi_row);
    }

    #[test]
    fn parse_insert_multi_row_from_stdin() {
        let cmd = parse_args(&args(&["sqlweave", "insert", "--multi-row", "--payload", "-"])).unwrap();
        let Command::Build(b) = cmd else {
            panic!("expected build");
        };
        assert_eq!(b.kind, StatementKind::Insert);
        assert!(b.multi_row);
        assert_eq!(b.common.payload, None);
    }

    #[test]
    fn multi_row_is_insert_only() {
        assert!(parse_args(&args(&["sqlweave", "delete", "--multi-row"])).is_err());
    }

    #[test]
    fn infer_takes_payload_options_only() {
        let cmd = parse_args(&args(&["sqlweave", "infer", "--payload=rows.json", "--pretty"])).unwrap();
        let Command::Infer(i) = cmd else {
            panic!("expected infer");
        };
        assert_eq!(i.common.payload, Some(PathBuf::from("rows.json")));
        assert!(i.common.pretty);

        for flag in [&["--dialect", "mysql"][..], &["--config", "weave.toml"], &["--log-sql"]] {
            let mut list = vec!["sqlweave", "infer"];
            list.extend_from_slice(flag);
            let err = parse_args(&args(&list)).unwrap_err();
            assert_eq!(err.to_string(), format!("{} is not accepted by infer", flag[0]));
        }
    }

    #[test]
    fn help_and_unknown() {
        assert!(matches!(
            parse_args(&args(&["sqlweave"])).unwrap(),
            Command::Help(HelpTopic::Root)
        ));
        assert!(matches!(
            parse_args(&args(&["sqlweave", "create-table", "-h"])).unwrap(),
            Command::Help(HelpTopic::Build(StatementKind::CreateTable))
        ));
        assert!(parse_args(&args(&["sqlweave", "merge"])).is_err());
        assert!(parse_args(&args(&["sqlweave", "select", "--dialect"])).is_err());
    }
}
