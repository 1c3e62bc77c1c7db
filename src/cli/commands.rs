use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::params::Captures;
use crate::router::Router;
use crate::runtime_config::RuntimeConfig;
use crate::table::RouteTable;

/// Command-line interface for rivet route tables
#[derive(Parser, Debug)]
#[command(name = "rivet")]
#[command(version, about = "Trie-based HTTP router: route table tools", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a route table: patterns, filters and conflicts
    Check {
        /// Path to the TOML route table
        table: PathBuf,
    },
    /// Match a method and path against a route table
    Match {
        /// Path to the TOML route table
        table: PathBuf,
        /// HTTP method, case-insensitive
        method: String,
        /// Request path, e.g. /repos/acme/widget
        path: String,
    },
    /// List the routes of a table in registration order
    Routes {
        /// Path to the TOML route table
        table: PathBuf,
    },
}

/// Parse the process arguments and run the command on stdout.
///
/// # Errors
///
/// Any failure of [`execute`].
pub fn run_cli(cli: Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &mut out)
}

/// Run `command`, writing its report to `out`.
///
/// # Errors
///
/// Unreadable or invalid tables, an invalid method, or (for `match`) a path
/// that matches no route.
pub fn execute(command: &Commands, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Check { table } => {
            let router = load_router(table)?;
            writeln!(
                out,
                "{}: {} routes OK",
                table.display(),
                router.len()
            )?;
        }
        Commands::Match {
            table,
            method,
            path,
        } => {
            let router = load_router(table)?;
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("Invalid HTTP method: {method}"))?;

            let mut captures = Captures::new();
            let node = router.match_route(&method, path, &mut captures, None);
            let Some(route) = node.route() else {
                bail!("No route matches {method} {path}");
            };

            let mut params = Map::new();
            let mut raw = Map::new();
            for capture in captures.iter() {
                params.insert(capture.name.to_string(), capture.value.clone());
                raw.insert(capture.name.to_string(), Value::from(capture.text.as_str()));
            }
            let report = json!({
                "id": node.id().get(),
                "route": route.name(),
                "pattern": node.pattern(),
                "params": params,
                "raw": raw,
            });
            writeln!(out, "{report}")?;
        }
        Commands::Routes { table } => {
            let router = load_router(table)?;
            for info in router.routes() {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    info.id,
                    info.method,
                    info.pattern,
                    info.route.name().unwrap_or("-")
                )?;
            }
        }
    }
    Ok(())
}

fn load_router(path: &Path) -> Result<Router> {
    let table = RouteTable::load(path)
        .with_context(|| format!("Failed to load route table: {}", path.display()))?;
    table
        .build_router_with(RuntimeConfig::from_env())
        .with_context(|| format!("Invalid route table: {}", path.display()))
}
