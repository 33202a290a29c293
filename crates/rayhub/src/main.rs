// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rayhub - CRM lead routing, project provisioning and proposal service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod admin;
mod serve;
mod size;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rayhub_config::RayhubConfig;
use rayhub_core::types::QueueType;
use rayhub_sizing::RoofType;

/// Rayhub - CRM lead routing, project provisioning and proposal service.
#[derive(Parser, Debug)]
#[command(name = "rayhub", version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the XDG lookup).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway and Telegram bridge.
    Serve,
    /// Manage assignment queues.
    #[command(subcommand)]
    Queue(QueueCommand),
    /// Manage the Telegram chat pool.
    #[command(subcommand)]
    Pool(PoolCommand),
    /// Size a solar plant and print the equipment bill.
    Size(SizeArgs),
    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum QueueCommand {
    /// List entries in selection order.
    List {
        #[arg(long)]
        queue: Option<QueueType>,
    },
    /// Add a user to a queue.
    Add {
        user_id: i64,
        queue: QueueType,
        #[arg(long, default_value_t = 10)]
        rank: i64,
    },
    /// Stop assigning leads to an entry.
    Pause { entry_id: i64 },
    /// Resume assigning leads to an entry.
    Resume { entry_id: i64 },
    /// Replace every entry from a JSON file of `{user_id, queues}` rows.
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum PoolCommand {
    /// List pooled groups.
    List,
    /// Add a Telegram group to the pool.
    Seed { name: String, tg_chat_id: String },
    /// Return a group to the pool.
    Release { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration and report errors.
    Check,
    /// Print the effective configuration with secrets redacted.
    Show,
}

#[derive(clap::Args, Debug)]
struct SizeArgs {
    #[command(subcommand)]
    mode: SizeMode,
    /// Panel model, e.g. "Trina Vertex S+ 575W".
    #[arg(long, global = true)]
    panel: Option<String>,
    /// Print JSON instead of a table.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum SizeMode {
    /// From monthly consumption in MWh.
    Consumption { monthly_mwh: f64 },
    /// From planned DC power in kW.
    Power { planned_dc_kw: f64 },
    /// From usable roof area in m2.
    Roof {
        area_m2: f64,
        #[arg(long, default_value = "tilted")]
        roof_type: RoofType,
    },
    /// From inverters given as MODEL=QTY and a panel count.
    Manual {
        #[arg(long = "inverter", required = true)]
        inverters: Vec<String>,
        #[arg(long)]
        panel_qty: u32,
    },
}

fn load_config(path: Option<&std::path::Path>) -> RayhubConfig {
    let loaded = match path {
        Some(path) => rayhub_config::load_and_validate_path(path),
        None => rayhub_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            rayhub_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Size(args)) => size::run_size(args),
        Some(Commands::Serve) => serve::run_serve(load_config(cli.config.as_deref())).await,
        Some(Commands::Queue(cmd)) => {
            admin::run_queue(&load_config(cli.config.as_deref()), cmd).await
        }
        Some(Commands::Pool(cmd)) => {
            admin::run_pool(&load_config(cli.config.as_deref()), cmd).await
        }
        Some(Commands::Config(ConfigCommand::Check)) => {
            let config = load_config(cli.config.as_deref());
            println!(
                "rayhub: config OK (service.name={}, gateway {}:{})",
                config.service.name, config.gateway.host, config.gateway.port
            );
            Ok(())
        }
        Some(Commands::Config(ConfigCommand::Show)) => {
            admin::show_config(&load_config(cli.config.as_deref()))
        }
        None => {
            println!("rayhub: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_queue_add_with_default_rank() {
        let cli = Cli::try_parse_from(["rayhub", "queue", "add", "7", "kcc"]).unwrap();
        match cli.command {
            Some(Commands::Queue(QueueCommand::Add {
                user_id,
                queue,
                rank,
            })) => {
                assert_eq!(user_id, 7);
                assert_eq!(queue, QueueType::Kcc);
                assert_eq!(rank, 10);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_roof_sizing_with_panel() {
        let cli = Cli::try_parse_from([
            "rayhub",
            "size",
            "roof",
            "800",
            "--roof-type",
            "flat",
            "--panel",
            "Trina Vertex S+ 575W",
        ])
        .unwrap();
        let Some(Commands::Size(args)) = cli.command else {
            panic!("expected size command");
        };
        assert_eq!(args.panel.as_deref(), Some("Trina Vertex S+ 575W"));
        assert!(matches!(
            args.mode,
            SizeMode::Roof {
                roof_type: RoofType::Flat,
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_queue() {
        assert!(Cli::try_parse_from(["rayhub", "queue", "add", "7", "vip"]).is_err());
    }

    #[test]
    fn global_config_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["rayhub", "pool", "list", "--config", "/tmp/r.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.toml")));
    }

    #[test]
    #[serial_test::serial]
    fn config_file_is_overridden_by_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rayhub.toml");
        std::fs::write(&path, "[gateway]\nport = 9100\n").unwrap();

        let config = load_config(Some(&path));
        assert_eq!(config.gateway.port, 9100);

        // SAFETY: serialized with every other env-mutating test.
        unsafe { std::env::set_var("RAYHUB_GATEWAY_PORT", "9200") };
        let config = load_config(Some(&path));
        unsafe { std::env::remove_var("RAYHUB_GATEWAY_PORT") };
        assert_eq!(config.gateway.port, 9200);
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = rayhub_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.service.name, "rayhub");
    }
}
