//! Command-line surface
//!
//! ```text
//! prpc version
//! prpc serve demo --port 8080
//! prpc inspect demo
//! prpc codegen -m demo -t ts -o web/client.ts
//! ```

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::builder::{build_registry, load_module};
use crate::codegen::{write_client, Target};
use crate::config::ServerConfig;
use crate::rpc::interpreter::Interpreter;
use crate::rpc::introspect::describe_all;
use crate::rpc::registry::{DuplicatePolicy, Registry};
use crate::rpc::schema::SchemaMap;
use crate::transport;

/// pRPC: typed remote procedures over a single JSON endpoint
#[derive(Parser, Debug)]
#[command(name = "prpc", disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the pRPC version
    Version,

    /// Serve a module's procedures over HTTP
    Serve {
        /// Module whose procedures are served (e.g. 'demo')
        module: String,

        /// Bind to this host [default: 127.0.0.1]
        #[arg(long)]
        host: Option<String>,

        /// Bind to this port [default: 8000]
        #[arg(short, long)]
        port: Option<u16>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the procedures a module registers
    Inspect {
        /// Module to inspect
        module: String,
    },

    /// Generate a client for a module's procedures
    Codegen {
        /// Module to introspect
        #[arg(short, long)]
        module: String,

        /// Target language (only 'ts' is supported)
        #[arg(short, long, default_value = "ts")]
        target: String,

        /// Output file path
        #[arg(short, long, default_value = "client.ts")]
        output: PathBuf,
    },
}

/// Run a parsed command, writing user-facing output to `out`
pub async fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    match cli.command {
        Command::Version => {
            writeln!(out, "pRPC version: {}", env!("CARGO_PKG_VERSION"))?;
        }

        Command::Serve {
            module,
            host,
            port,
            config,
        } => {
            let mut config = ServerConfig::load(config.as_deref())?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let registry = build_registry(&module, config.registry.duplicate_policy)?;
            writeln!(out, "Starting pRPC server for {}", module)?;
            writeln!(out, "Endpoint: {}", config.endpoint())?;
            out.flush()?;

            let interpreter = Arc::new(Interpreter::new(registry));
            transport::serve(&config, interpreter).await?;
        }

        Command::Inspect { module } => {
            let registry = build_registry(&module, DuplicatePolicy::Replace)?;
            let schemas = describe_all(&registry);
            if schemas.is_empty() {
                writeln!(out, "No procedures found in registry for this module.")?;
            } else {
                write!(out, "{}", format_table(&module, &schemas))?;
            }
        }

        Command::Codegen {
            module,
            target,
            output,
        } => {
            let target: Target = target.parse()?;
            let registry = Registry::new();
            load_module(&module, &registry)?;

            writeln!(out, "Generating TypeScript client for {}...", module)?;
            write_client(&describe_all(&registry), target, &output)?;
            writeln!(out, "Successfully generated {}", output.display())?;
        }
    }
    Ok(())
}

/// Render the `inspect` listing as an aligned text table
pub fn format_table(module: &str, schemas: &SchemaMap) -> String {
    let header = ["Method", "Params", "Returns", "Doc"];
    let rows: Vec<[String; 4]> = schemas
        .iter()
        .map(|schema| {
            let params = schema.parameter_summary();
            [
                schema.name.clone(),
                if params.is_empty() { "None".to_string() } else { params },
                schema.return_type.clone(),
                schema
                    .doc
                    .as_deref()
                    .and_then(|d| d.lines().next())
                    .unwrap_or("")
                    .to_string(),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = widths.map(|w| "-".repeat(w));
    let mut table = format!("pRPC Registry: {}\n\n", module);
    table.push_str(&table_line(header, widths));
    table.push_str(&table_line(rule.each_ref().map(String::as_str), widths));
    for row in &rows {
        table.push_str(&table_line(row.each_ref().map(String::as_str), widths));
    }
    table
}

fn table_line(cells: [&str; 4], widths: [usize; 4]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run_args(args: &[&str]) -> (anyhow::Result<()>, String) {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        let result = run(cli, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_version() {
        let (result, out) = run_args(&["prpc", "version"]).await;
        result.unwrap();
        assert_eq!(out, format!("pRPC version: {}\n", env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn test_inspect_demo() {
        let (result, out) = run_args(&["prpc", "inspect", "demo"]).await;
        result.unwrap();

        assert!(out.starts_with("pRPC Registry: demo"));
        let add = out.lines().find(|l| l.starts_with("add ")).unwrap();
        assert!(add.contains("a: i64, b: i64"));
        assert!(add.contains("Add two integers."));
        let status = out.lines().find(|l| l.starts_with("get_status")).unwrap();
        assert!(status.contains("None"));
        assert!(status.contains("Status"));
    }

    #[tokio::test]
    async fn test_inspect_empty() {
        let (result, out) = run_args(&["prpc", "inspect", "empty"]).await;
        result.unwrap();
        assert_eq!(out, "No procedures found in registry for this module.\n");
    }

    #[tokio::test]
    async fn test_inspect_unknown_module_fails() {
        let (result, _) = run_args(&["prpc", "inspect", "missing"]).await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Could not import module 'missing'"));
    }

    #[tokio::test]
    async fn test_codegen_writes_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/client.ts");
        let path_arg = path.to_str().unwrap();

        let (result, out) = run_args(&["prpc", "codegen", "-m", "demo", "-o", path_arg]).await;
        result.unwrap();

        assert!(out.ends_with(&format!("Successfully generated {}\n", path_arg)));
        let client = std::fs::read_to_string(&path).unwrap();
        assert!(client.contains("async add(a: number, b?: number): Promise<number>"));
        assert!(client.contains("async greet(name?: string): Promise<string>"));
    }

    #[tokio::test]
    async fn test_codegen_rejects_unknown_target() {
        let (result, out) = run_args(&["prpc", "codegen", "-m", "demo", "-t", "py"]).await;
        assert!(result.unwrap_err().to_string().contains("Target 'py' is not supported"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_serve_arguments() {
        let cli = Cli::try_parse_from(["prpc", "serve", "demo", "--port", "9000"]).unwrap();
        match cli.command {
            Command::Serve { module, host, port, config } => {
                assert_eq!(module, "demo");
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
                assert_eq!(config, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
