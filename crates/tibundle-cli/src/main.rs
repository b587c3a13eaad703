use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tibundle::{
    commands::{
        build::{self, BuildCommand},
        config::{self, ConfigAction},
        modules, plugins,
    },
    logger, GlobalOpts,
};

#[derive(Parser)]
#[command(name = "tibundle")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Bundle orchestrator for Titanium-style app projects",
    long_about = "tibundle bundles an app's module graph into a single deployable script, \
excluding native modules the host platform provides, and emits the bundle with a \
rewritten source map and bootstrap files."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle the project for one platform
    Build(BuildCommand),

    /// Declare a plugin in the project manifest
    Install {
        plugin: String,
        /// Pin an explicit version instead of "latest"
        #[arg(long = "plugin-version", value_name = "VERSION")]
        version: Option<String>,
        /// Project directory (searched upward for tiapp.xml)
        #[arg(long, value_name = "DIR", default_value = ".")]
        project_dir: PathBuf,
    },

    /// Remove a plugin declaration from the project manifest
    Remove {
        plugin: String,
        /// Project directory (searched upward for tiapp.xml)
        #[arg(long, value_name = "DIR", default_value = ".")]
        project_dir: PathBuf,
    },

    /// List plugins declared in the project manifest
    List {
        /// Project directory (searched upward for tiapp.xml)
        #[arg(long, value_name = "DIR", default_value = ".")]
        project_dir: PathBuf,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Inspect native-module declarations and exclusion sets
    Modules {
        /// Project directory (searched upward for tiapp.xml)
        #[arg(long, value_name = "DIR", default_value = ".")]
        project_dir: PathBuf,
        /// Filter by platform
        #[arg(short, long)]
        platform: Option<String>,
        /// Filter by deploy type
        #[arg(long, value_name = "TYPE")]
        deploy_type: Option<String>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Configure the tibundle tool
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    if cli.global.verbosity_level() >= 2 {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    match cli.command {
        Commands::Build(cmd) => {
            if let Err(e) = build::handle_build(cmd, cli.global) {
                logger::error(&format!("{}", e));
                std::process::exit(1);
            }
        }
        Commands::Install {
            plugin,
            version,
            project_dir,
        } => {
            if let Err(e) = plugins::install_plugin(&project_dir, &plugin, version.as_deref()) {
                logger::error(&format!("{}", e));
                std::process::exit(1);
            }
        }
        Commands::Remove {
            plugin,
            project_dir,
        } => {
            if let Err(e) = plugins::remove_plugin(&project_dir, &plugin) {
                logger::error(&format!("{}", e));
                std::process::exit(1);
            }
        }
        Commands::List { project_dir, json } => {
            if let Err(e) = plugins::list_plugins(&project_dir, json) {
                logger::error(&format!("{}", e));
                std::process::exit(1);
            }
        }
        Commands::Modules {
            project_dir,
            platform,
            deploy_type,
            json,
        } => {
            if let Err(e) = modules::handle_modules(&project_dir, platform, deploy_type, json) {
                logger::error(&format!("{}", e));
                std::process::exit(1);
            }
        }
        Commands::Config { action } => {
            if let Err(e) = config::handle_config(action) {
                logger::error(&format!("{}", e));
                std::process::exit(1);
            }
        }
    }
}
