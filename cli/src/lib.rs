//! depends CLI: configure builds against a prebuilt dependency tree.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use depends_core::configure::{configure, ConfigureOptions};
use depends_core::copy::copy_runtime_dependencies;
use depends_core::environment::{BuildEnvironment, ToolchainVar};
use depends_core::manifest::split_command;

/// CLI entrypoint for depends.
#[derive(Debug, Parser)]
#[command(
    name = "depends",
    about = "Configure builds against a prebuilt dependency tree"
)]
pub struct Cli {
    /// Build directory holding the cached environment
    #[arg(
        long = "build-dir",
        default_value = "build",
        global = true,
        value_hint = ValueHint::DirPath
    )]
    build_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read the dependency tree manifest and record build settings
    Configure(ConfigureArgs),
    /// Print the configured dependency root
    HostPath,
    /// Copy built and bundled libraries into the install layout
    CopyDlls(CopyDllsArgs),
}

#[derive(Debug, Args)]
struct ConfigureArgs {
    /// Where dependency tools and libraries are located
    #[arg(long = "depends", default_value = "", value_hint = ValueHint::DirPath)]
    depends: String,

    /// Allow usage of system packages along with those in the depends path
    #[arg(long = "depends-allow-system", action = ArgAction::SetTrue)]
    allow_system: bool,
}

#[derive(Debug, Args)]
struct CopyDllsArgs {
    /// Project root the build tree lives under
    #[arg(long = "project-root", default_value = ".", value_hint = ValueHint::DirPath)]
    project_root: PathBuf,
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Configure(args) => run_configure(&cli.build_dir, args),
        Command::HostPath => run_host_path(&cli.build_dir),
        Command::CopyDlls(args) => run_copy_dlls(&cli.build_dir, &args),
    }
}

fn run_configure(build_dir: &Path, args: ConfigureArgs) -> Result<()> {
    let mut build_env = load_environment(build_dir)?.unwrap_or_default();

    seed_toolchain_from_process(&mut build_env);

    let opts = ConfigureOptions {
        depends: args.depends,
        allow_system: args.allow_system,
    };
    configure(&mut build_env, &opts)?;

    for (key, value) in build_env.exported_env() {
        env::set_var(key, value);
    }

    build_env
        .store(build_dir)
        .with_context(|| format!("could not store environment in {}", build_dir.display()))?;
    Ok(())
}

fn run_host_path(build_dir: &Path) -> Result<()> {
    let build_env = load_configured(build_dir)?;
    println!("{}", build_env.host_path().display());
    Ok(())
}

fn run_copy_dlls(build_dir: &Path, args: &CopyDllsArgs) -> Result<()> {
    let build_env = load_configured(build_dir)?;
    let stdout = io::stdout();
    copy_runtime_dependencies(&build_env, &args.project_root, stdout.lock())?;
    Ok(())
}

fn load_environment(build_dir: &Path) -> Result<Option<BuildEnvironment>> {
    BuildEnvironment::load(build_dir)
        .with_context(|| format!("could not load environment from {}", build_dir.display()))
}

fn load_configured(build_dir: &Path) -> Result<BuildEnvironment> {
    load_environment(build_dir)?.ok_or_else(|| {
        anyhow!(
            "no environment in {}; run `depends configure` first",
            build_dir.display()
        )
    })
}

/// Seed unset toolchain variables from the caller's process environment so
/// explicit user settings always win over manifest values.
fn seed_toolchain_from_process(build_env: &mut BuildEnvironment) {
    for var in ToolchainVar::ALL {
        if !build_env.toolchain(var).is_empty() {
            continue;
        }
        if let Ok(command) = env::var(var.key()) {
            let tokens = split_command(&command);
            if !tokens.is_empty() {
                build_env.set_toolchain(var, tokens);
            }
        }
    }
}
