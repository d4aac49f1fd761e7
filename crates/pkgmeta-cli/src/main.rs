mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_RECORD_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pkgmeta",
    version,
    about = "Inspect package records, dependency lists, and path manifests"
)]
struct Cli {
    /// Context file (TOML) with subdir, channel_alias, and default_channels.
    #[arg(long, global = true, env = "PKGMETA_CONFIG")]
    config: Option<PathBuf>,

    /// Default subdir for records that carry no subdir, URL, or platform.
    #[arg(long, global = true, env = "PKGMETA_SUBDIR")]
    subdir: Option<String>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show identity and derived fields of an index.json or repodata.json.
    Show {
        /// Path to the record document.
        #[arg(default_value = "index.json")]
        file: PathBuf,
    },
    /// List the merged depends/constrains of each record.
    Depends {
        /// Path to the record document.
        #[arg(default_value = "index.json")]
        file: PathBuf,
    },
    /// Summarize a paths.json manifest.
    Paths {
        /// Path to the paths manifest.
        #[arg(default_value = "paths.json")]
        file: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PKGMETA_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;
    let context = || commands::load_context(cli.config.as_deref(), cli.subdir.as_deref());
    let result = match cli.command {
        Commands::Show { file } => {
            context().and_then(|ctx| commands::show::run(&file, &ctx, json_output))
        }
        Commands::Depends { file } => {
            context().and_then(|ctx| commands::depends::run(&file, &ctx, json_output))
        }
        Commands::Paths { file } => commands::paths::run(&file, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("record error:") {
                EXIT_RECORD_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
