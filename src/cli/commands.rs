use crate::client::{Call, Client};
use crate::registry::fold_identifier;
use crate::router::Router;
use crate::spec::{load_spec, Spec};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

/// Command-line interface for oasbind
#[derive(Debug, Parser)]
#[command(name = "oasbind", version)]
#[command(about = "Inspect and call OpenAPI operations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List operation ids, folded names, methods and paths
    Operations {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long, env = "OASBIND_SPEC")]
        spec: PathBuf,
    },
    /// List every route (operation × server base path)
    Routes {
        #[arg(short, long, env = "OASBIND_SPEC")]
        spec: PathBuf,
    },
    /// Perform a validated call over HTTP and print status and payload
    Call {
        #[arg(short, long, env = "OASBIND_SPEC")]
        spec: PathBuf,

        /// Server URL; defaults to the first declared server
        #[arg(long, env = "OASBIND_SERVER_URL")]
        server_url: Option<String>,

        /// Operation id or its snake_case fold
        operation: String,

        /// Positional path values, in template order
        args: Vec<String>,

        /// Query parameter, repeatable
        #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        query: Vec<(String, String)>,

        /// Header, repeatable
        #[arg(long = "header", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        header: Vec<(String, String)>,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,

        /// Skip response validation
        #[arg(long, default_value_t = false)]
        no_validate_responses: bool,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))
}

/// One line per operation: `operationId  folded  METHOD path`.
#[must_use]
pub fn describe_operations(spec: &Spec) -> Vec<String> {
    spec.operations()
        .iter()
        .map(|op| {
            format!(
                "{}\t{}\t{}\t{}",
                op.operation_id,
                fold_identifier(&op.operation_id),
                op.method,
                op.path
            )
        })
        .collect()
}

/// One line per installed route: `METHOD pattern -> operationId`.
#[must_use]
pub fn describe_routes(spec: &Spec) -> Vec<String> {
    Router::new(spec.operations(), &spec.base_paths())
        .routes()
        .iter()
        .map(|r| format!("{} {} -> {}", r.method(), r.path_pattern(), r.operation_id()))
        .collect()
}

/// Execute a parsed command, writing results to `out`.
///
/// # Errors
///
/// Spec loading, client construction, call failures, or write failures.
pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    match cli.command {
        Commands::Operations { spec } => {
            let spec = load_spec(&spec)?;
            for line in describe_operations(&spec) {
                writeln!(out, "{line}")?;
            }
        }
        Commands::Routes { spec } => {
            let spec = load_spec(&spec)?;
            for line in describe_routes(&spec) {
                writeln!(out, "{line}")?;
            }
        }
        Commands::Call {
            spec,
            server_url,
            operation,
            args,
            query,
            header,
            body,
            no_validate_responses,
        } => {
            let spec = load_spec(&spec)?;
            let mut builder = Client::builder(spec).validate_responses(!no_validate_responses);
            if let Some(url) = server_url {
                builder = builder.server_url(url);
            }
            let client = builder.build()?;

            let mut call = Call::new().args(args).headers(header);
            for (k, v) in query {
                call = call.query(k, v);
            }
            if let Some(body) = body {
                let value = serde_json::from_str(&body).context("--body is not valid JSON")?;
                call = call.body(value);
            }

            let response = client
                .call(&operation, call)
                .with_context(|| format!("call to `{operation}` failed"))?;
            writeln!(out, "{}", response.status)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&response.payload())?)?;
        }
    }
    Ok(())
}

/// Parse process arguments and run.
///
/// # Errors
///
/// See [`run`].
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    run(cli, &mut lock)
}
