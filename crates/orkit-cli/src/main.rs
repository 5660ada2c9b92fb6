mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{changelog::Format, config::ConfigSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "orkit",
    about = "Build tooling for a plugin marketplace: aggregate skill/agent metadata, release props and CI reports",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from orkit.yaml or .git/)
    #[arg(long, global = true, env = "ORKIT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan skills, agents, manifests and hooks and write the docs-site data files
    Aggregate,

    /// Turn a changelog release section into video props JSON
    Changelog {
        /// Release to extract (default: the first release in the file)
        #[arg(id = "release", value_name = "VERSION")]
        version: Option<String>,

        /// 1920x1080 props (default)
        #[arg(long, conflicts_with = "square")]
        landscape: bool,

        /// 1080x1080 props
        #[arg(long)]
        square: bool,

        /// Write the props here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Collect CI signals, score them and write the HTML/JSON report
    CiReport {
        /// Report path (default: ci.output from orkit.yaml)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Only read CI_* environment variables; never spawn subprocesses
        #[arg(long)]
        no_probe: bool,
    },

    /// Show global and scoped hook registrations
    Hooks,

    /// Print the parsed frontmatter of a markdown file
    Inspect { file: PathBuf },

    /// Rewrite agent frontmatter into the current field layout
    MigrateAgents {
        /// Agents directory (default: sources.agents_dir from orkit.yaml)
        dir: Option<PathBuf>,
    },

    /// Show or validate orkit.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Aggregate => cmd::aggregate::run(&root, cli.json),
        Commands::Changelog {
            version,
            landscape: _,
            square,
            output,
        } => {
            let format = if square {
                Format::Square
            } else {
                Format::Landscape
            };
            cmd::changelog::run(&root, version.as_deref(), format, output.as_deref())
        }
        Commands::CiReport { output, no_probe } => {
            cmd::ci_report::run(&root, output.as_deref(), no_probe, cli.json)
        }
        Commands::Hooks => cmd::hooks::run(&root, cli.json),
        Commands::Inspect { file } => cmd::inspect::run(&root, &file),
        Commands::MigrateAgents { dir } => cmd::migrate::run(&root, dir.as_deref(), cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
