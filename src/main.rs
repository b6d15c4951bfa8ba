// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use ansible_dns_inventory::{
    config::InventoryConfig,
    constants::TOKIO_WORKER_THREADS,
    datasource,
    errors::InventoryError,
    export::{export_attributes, export_groups, export_hosts, export_inventory, export_tree},
    format::{render_attributes, render_list_map, render_value, OutputFormat},
    inventory::Inventory,
};
use anyhow::Result;
use clap::{ArgGroup, CommandFactory, Parser};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing::{debug, info};

/// Ansible dynamic inventory backed by DNS TXT records or etcd.
#[derive(Debug, Parser)]
#[command(name = "ansible-dns-inventory", version, about, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["list", "host", "hosts", "groups", "attrs", "tree", "import", "completions"]),
))]
struct Cli {
    /// Print the Ansible JSON inventory
    #[arg(long)]
    list: bool,

    /// Print the variables of a single host
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Print every host with the groups it belongs to
    #[arg(long)]
    hosts: bool,

    /// Print every group with the hosts it contains
    #[arg(long)]
    groups: bool,

    /// Print the attribute records of every host
    #[arg(long)]
    attrs: bool,

    /// Print the group tree
    #[arg(long)]
    tree: bool,

    /// Publish host records from a YAML file to the datasource
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,

    /// Print a shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file, instead of the usual search path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "ansible-dns-inventory",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    init_tracing();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("ansible-dns-inventory")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

/// Logs always go to stderr; stdout carries inventory data only.
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT` (`json` or `text`).
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    let config = InventoryConfig::load(cli.config.as_deref())
        .map_err(|e| fatal(InventoryError::from(e)))?;
    debug!("Using the {} datasource", config.datasource);

    let source = datasource::new(&config).map_err(fatal)?;
    let inventory = Inventory::new(config, source).map_err(fatal)?;

    let result = run(&cli, &inventory).await;
    inventory.close().await.map_err(fatal)?;

    if let Some(output) = result? {
        emit(&output);
    }

    Ok(())
}

/// Execute the selected mode and return what should be printed.
async fn run(cli: &Cli, inventory: &Inventory) -> Result<Option<String>> {
    if let Some(path) = &cli.import {
        let count = inventory.import_file(path).await.map_err(fatal)?;
        info!("Import of {} finished: {} records", path.display(), count);
        return Ok(None);
    }

    if let Some(host) = &cli.host {
        if !inventory.config().txt.vars.enabled {
            return Ok(Some("{}".to_string()));
        }
        let variables = inventory.get_host_variables(host).await.map_err(fatal)?;
        let format = cli.format.unwrap_or(OutputFormat::Json);
        return render_value(&variables, format).map(Some);
    }

    let hosts = inventory.get_hosts().await.map_err(fatal)?;

    let output = if cli.attrs {
        let attributes = export_attributes(&hosts, inventory.keys());
        render_attributes(
            &attributes,
            inventory.keys(),
            cli.format.unwrap_or(OutputFormat::YamlFlow),
        )?
    } else {
        let tree = inventory.build(&hosts);

        if cli.list {
            render_value(&export_inventory(&tree), cli.format.unwrap_or(OutputFormat::Json))?
        } else if cli.hosts {
            render_list_map(&export_hosts(&tree), cli.format.unwrap_or_default())?
        } else if cli.groups {
            render_list_map(&export_groups(&tree), cli.format.unwrap_or_default())?
        } else {
            render_value(&export_tree(&tree), cli.format.unwrap_or(OutputFormat::Yaml))?
        }
    };

    Ok(Some(output))
}

fn fatal(error: InventoryError) -> anyhow::Error {
    if error.is_configuration_error() {
        anyhow::Error::new(error).context("Invalid configuration")
    } else {
        error.into()
    }
}

fn emit(output: &str) {
    if output.ends_with('\n') {
        print!("{output}");
    } else {
        println!("{output}");
    }
}
