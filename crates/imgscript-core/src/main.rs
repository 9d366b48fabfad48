use anyhow::Context;
use clap::{value_parser, Arg, Command};
use imgscript_core::{init_tracing, run_stress, RuntimeConfig, StressConfig};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Command::new("imgscript")
        .version(env!("CARGO_PKG_VERSION"))
        .about("imgscript scheduler diagnostics")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Runtime configuration file (TOML)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("stress")
                .about("Run the per-item ordering stress test")
                .arg(
                    Arg::new("items")
                        .long("items")
                        .default_value("4")
                        .value_parser(value_parser!(usize))
                        .help("Number of items to create"),
                )
                .arg(
                    Arg::new("tasks")
                        .long("tasks")
                        .default_value("1000")
                        .value_parser(value_parser!(usize))
                        .help("Tasks submitted by each caller"),
                )
                .arg(
                    Arg::new("callers")
                        .long("callers")
                        .default_value("8")
                        .value_parser(value_parser!(usize))
                        .help("Number of concurrent callers"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Load, validate and print a runtime configuration")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Configuration file to check"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("stress", args)) => {
            let config = match args.get_one::<PathBuf>("config") {
                Some(path) => RuntimeConfig::load(path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => RuntimeConfig::default(),
            };
            init_tracing(&config.logging)?;

            let stress = StressConfig {
                items: args.get_one::<usize>("items").copied().unwrap_or(4),
                tasks_per_caller: args.get_one::<usize>("tasks").copied().unwrap_or(1000),
                callers: args.get_one::<usize>("callers").copied().unwrap_or(8),
            };

            println!("Running stress test...");
            println!("Items: {}", stress.items);
            println!("Callers: {}", stress.callers);
            println!("Tasks per caller: {}", stress.tasks_per_caller);
            println!();

            let report = run_stress(stress, config.collection).await?;
            println!("{}", report.generate_text());

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("check-config", args)) => {
            let path = args
                .get_one::<PathBuf>("path")
                .context("missing configuration path")?;
            let config = RuntimeConfig::load(path)
                .with_context(|| format!("checking {}", path.display()))?;

            println!("{} is valid", path.display());
            println!();
            print!("{}", config.to_toml_string()?);
        }
        _ => {}
    }

    Ok(())
}
