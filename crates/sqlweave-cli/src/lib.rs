mod cli;
mod config;

use cli::{BuildArgs, CommonArgs, InferArgs, StatementKind};
use config::ConfigFile;
use serde::Serialize;
use sqlweave::payload::{json_create_table, json_delete, json_insert, json_select, json_update};
use sqlweave::{Frame, QueryBuilder, cast_frame, parse_dialect};
use std::io::Read;
use tracing_subscriber::EnvFilter;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Build(args) => {
            init_tracing(args.common.log_sql);
            build(args)
        }
        cli::Command::Infer(args) => {
            init_tracing(false);
            infer(args)
        }
    }
}

/// Logs go to stderr so stdout stays valid JSON.
fn init_tracing(log_sql: bool) {
    let default = if log_sql { "warn,sqlweave=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SQLWEAVE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn session(common: &CommonArgs) -> anyhow::Result<QueryBuilder> {
    let mut config = match &common.config {
        Some(path) => ConfigFile::load(path)?.builder,
        None => Default::default(),
    };
    if let Some(name) = &common.dialect {
        config.dialect = parse_dialect(name)?;
    }
    if common.log_sql {
        config.log_sql = true;
    }
    tracing::debug!(dialect = %config.dialect, "session configured");
    Ok(QueryBuilder::with_config(config))
}

fn read_payload(common: &CommonArgs) -> anyhow::Result<serde_json::Value> {
    let raw = match &common.payload {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read payload {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("payload is not valid JSON: {e}"))
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn build(args: BuildArgs) -> anyhow::Result<()> {
    let session = session(&args.common)?;
    let payload = read_payload(&args.common)?;

    match args.kind {
        StatementKind::Select => emit(&json_select(&payload, &session)?, args.common.pretty),
        StatementKind::Insert => emit(
            &json_insert(&payload, &session, args.multi_row)?,
            args.common.pretty,
        ),
        StatementKind::Update => emit(&json_update(&payload, &session)?, args.common.pretty),
        StatementKind::Delete => emit(&json_delete(&payload, &session)?, args.common.pretty),
        StatementKind::CreateTable => {
            emit(&json_create_table(&payload, &session)?, args.common.pretty)
        }
    }
}

fn infer(args: InferArgs) -> anyhow::Result<()> {
    let records = read_payload(&args.common)?;
    let report = cast_frame(Frame::from_records(records)?);
    emit(&report, args.common.pretty)
}
