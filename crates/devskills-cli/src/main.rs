mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::manifest::ManifestSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "devskills",
    about = "IoT Edge developer skills: manifests, solutions, project layout and source hygiene",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root for scanning commands (default: current directory)
    #[arg(long, global = true, env = "DEVSKILLS_ROOT")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit deployment manifests
    Manifest {
        #[command(subcommand)]
        subcommand: ManifestSubcommand,
    },

    /// Detect the solution file and register module projects in it
    Solution {
        /// Only report which solution file was found
        #[arg(long)]
        detect: bool,

        /// Relative path of a module .csproj to add
        #[arg(long, value_name = "PATH")]
        add_module: Option<String>,

        /// Module display name for .sln instructions (default: project file stem)
        #[arg(long)]
        module_name: Option<String>,
    },

    /// Detect the project's modules, contracts, manifests and registry
    DetectStructure {
        /// Ignore any saved configuration and re-detect
        #[arg(long)]
        force: bool,

        /// Save the detected configuration for later runs
        #[arg(long)]
        save: bool,
    },

    /// Strip trailing newlines from C# and MSBuild sources
    FixNewlines {
        /// Directory to process (default: the root)
        dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Play the notification sound for a hook event
    PlaySound {
        /// session_start, stop or permission
        #[arg(default_value = "stop")]
        event: String,
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
        Commands::Manifest { subcommand } => cmd::manifest::run(&root, subcommand),
        Commands::Solution {
            detect,
            add_module,
            module_name,
        } => cmd::solution::run(
            &root,
            detect,
            add_module.as_deref(),
            module_name.as_deref(),
        ),
        Commands::DetectStructure { force, save } => cmd::structure::run(&root, force, save),
        Commands::FixNewlines { dir, json } => {
            let dir = dir.map(|d| root::resolve_root(Some(&d))).unwrap_or(root);
            cmd::newlines::run(&dir, json)
        }
        Commands::PlaySound { event } => cmd::sound::run(&event),
    };

    if let Err(e) = result {
        eprintln!("{}", output::error_json(&e));
        std::process::exit(1);
    }
}
