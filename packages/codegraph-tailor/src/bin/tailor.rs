//! Program Tailoring CLI
//!
//! # Usage
//!
//! ```bash
//! # Tailor a program for every criterion in app.sc
//! cargo run --bin codegraph-tailor --release -- run --program app.json --sc-file app.sc
//!
//! # Same, cycles removed and extension disabled, reports under out/
//! cargo run --bin codegraph-tailor -- run --program app.json --sc-file app.sc \
//!     --retain-cycle false --extend-sc false --out-dir out
//!
//! # Print the default configuration as YAML
//! cargo run --bin codegraph-tailor -- default-config
//! ```
//!
//! Logging is controlled through `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use codegraph_tailor::{Program, TailorConfig, TailoringDriver};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codegraph-tailor")]
#[command(about = "Program Tailoring - slice a program by sequential call-site criteria", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tailor a program for the criteria in a file
    Run {
        /// Program model (JSON)
        #[arg(short, long)]
        program: PathBuf,

        /// Sequential criteria, one per line
        #[arg(short, long = "sc-file")]
        sc_file: PathBuf,

        /// YAML configuration; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report output directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        #[arg(long)]
        retain_cycle: Option<bool>,

        #[arg(long)]
        extend_sc: Option<bool>,

        #[arg(long)]
        exclude_library: Option<bool>,

        #[arg(long)]
        exclude_library_extension: Option<bool>,

        /// Never enter methods of classes under this package (repeatable)
        #[arg(long = "block-package-prefix")]
        block_package_prefixes: Vec<String>,
    },

    /// Print the default configuration
    DefaultConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            program,
            sc_file,
            config,
            out_dir,
            retain_cycle,
            extend_sc,
            exclude_library,
            exclude_library_extension,
            block_package_prefixes,
        } => {
            let mut config = match config {
                Some(path) => TailorConfig::from_yaml_file(path)?,
                None => TailorConfig::default(),
            };
            if let Some(dir) = out_dir {
                config = config.out_dir(dir);
            }
            if let Some(v) = retain_cycle {
                config = config.retain_cycle(v);
            }
            if let Some(v) = extend_sc {
                config = config.extend_sc(v);
            }
            if let Some(v) = exclude_library {
                config = config.exclude_library(v);
            }
            if let Some(v) = exclude_library_extension {
                config = config.exclude_library_extension(v);
            }
            for prefix in block_package_prefixes {
                config = config.block_package_prefix(prefix);
            }
            run(&program, &sc_file, &config)?;
        }
        Commands::DefaultConfig => {
            print!("{}", TailorConfig::default().to_yaml()?);
        }
    }

    Ok(())
}

fn run(program_path: &Path, sc_file: &Path, config: &TailorConfig) -> Result<(), Box<dyn std::error::Error>> {
    use codegraph_tailor::config::Validatable;

    config.validate()?;
    let program = Program::from_json_file(program_path)?;
    let driver = TailoringDriver::new(&program, &program, config);

    println!("Tailor starts.");
    let criteria = driver.read_criteria(sc_file)?;
    let results = driver.tailor(&criteria)?;
    for result in &results {
        if result.is_empty() {
            println!(
                "The tailored program for tail {} is empty, which means that the given criteria \
                 should be infeasible (if the ICFG is sound).",
                result.tail
            );
        }
        let path = driver.write_report(result)?;
        println!("Dumping analysis results to {} ...", path.display());
    }
    println!("Tailor finishes.");
    Ok(())
}
