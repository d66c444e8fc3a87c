//! modload - inspect and load module manifests
//!
//! Usage:
//!   modload plan <module> [--minified]
//!   modload load <module> --root <dir> [--define <symbol>]... [--timeout-secs <n>]
//!   modload check
//!
//! Every subcommand accepts `--config <file>` and `--manifests <dir>`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use module_loader::module::registry::{ManifestDiscovery, ModuleDependencies};
use module_loader::module::validation::{ManifestValidator, ValidationResult};
use module_loader::utils::init_logging_from_config;
use module_loader::{FileSystemFetcher, Loader, LoaderConfig, ModuleManifest};

#[derive(Parser, Debug)]
#[command(name = "modload", version, about = "Resolve and load declared modules")]
struct Cli {
    /// Loader configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Manifests directory (overrides the configuration)
    #[arg(long, global = true)]
    manifests: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the load order and resource URLs of a module
    Plan {
        module: String,
        /// Resolve minified resource variants
        #[arg(long)]
        minified: bool,
    },
    /// Load a module, serving resources from a directory
    Load {
        module: String,
        /// Directory holding the files under the configured base path
        #[arg(long)]
        root: PathBuf,
        /// Global symbol to treat as already defined (repeatable)
        #[arg(long = "define")]
        defines: Vec<String>,
        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Validate every discovered manifest and the combined dependency graph
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LoaderConfig::default(),
    }
    .with_env_overrides();
    if let Some(dir) = &cli.manifests {
        config.manifests_dir = dir.display().to_string();
    }
    config.validate()?;

    init_logging_from_config(config.logging.as_ref());

    match cli.command {
        Command::Plan { module, minified } => plan(&config, &module, minified),
        Command::Load {
            module,
            root,
            defines,
            timeout_secs,
        } => {
            if timeout_secs.is_some() {
                config.wait_timeout_secs = timeout_secs;
            }
            load(&config, &module, &root, &defines).await
        }
        Command::Check => check(&config),
    }
}

/// Loader with every discovered manifest declared
fn build_loader(config: &LoaderConfig, root: &Path) -> Result<Loader> {
    let fetcher = FileSystemFetcher::new(root, config.locator.base_path.clone());
    let mut loader = Loader::from_config(config, fetcher);

    let discovery = ManifestDiscovery::new(&config.manifests_dir);
    for discovered in discovery.discover_manifests()? {
        loader
            .declare_manifest(&discovered.manifest)
            .with_context(|| format!("declaring {}", discovered.path.display()))?;
    }
    info!("Declared {} modules", loader.registry().len());
    Ok(loader)
}

fn plan(config: &LoaderConfig, module: &str, minified: bool) -> Result<()> {
    let loader = build_loader(config, Path::new("."))?;
    let locator = loader
        .locator()
        .clone()
        .with_minified(minified || config.locator.minified);

    for name in loader.resolve(module)? {
        let descriptor = loader.descriptor(loader.lookup(&name)?);
        println!("{}", name);
        for resource in descriptor.resources() {
            let url = resource.resolve_with(&locator)?;
            println!("    {:<6} {}", resource.kind(), url.as_str());
        }
    }
    Ok(())
}

async fn load(config: &LoaderConfig, module: &str, root: &Path, defines: &[String]) -> Result<()> {
    let mut loader = build_loader(config, root)?;
    for symbol in defines {
        loader.define_global(symbol.clone());
    }

    let id = loader.lookup(module)?;
    let outcome = loader.wait_for(id).await;

    for name in loader.resolve(module)? {
        let descriptor = loader.descriptor(loader.lookup(&name)?);
        match descriptor.failure() {
            Some(error) => println!("{:<32} {:<10} {}", name, descriptor.state(), error),
            None => println!("{:<32} {}", name, descriptor.state()),
        }
    }

    outcome.with_context(|| format!("loading module {}", module))
}

fn check(config: &LoaderConfig) -> Result<()> {
    let discovery = ManifestDiscovery::new(&config.manifests_dir);
    let validator = ManifestValidator::new();
    let loader = build_loader(config, Path::new("."))?;
    let mut invalid = 0;

    for path in discovery.manifest_paths()? {
        let result = ModuleManifest::from_file(&path).map(|m| validator.validate(&m));
        match result {
            Ok(ValidationResult::Valid) => println!("ok      {}", path.display()),
            Ok(ValidationResult::Invalid(errors)) => {
                invalid += 1;
                println!("invalid {}", path.display());
                for error in errors {
                    println!("        {}", error);
                }
            }
            Err(e) => {
                invalid += 1;
                println!("error   {}: {}", path.display(), e);
            }
        }
    }

    match ModuleDependencies::resolve_all(loader.registry()) {
        Ok(resolution) => println!(
            "{} modules, load order: {}",
            resolution.load_order.len(),
            resolution.load_order.join(", ")
        ),
        Err(e) => {
            warn!("Dependency graph is broken: {}", e);
            bail!("dependency graph is broken: {}", e);
        }
    }

    for (_, descriptor) in loader.registry().iter() {
        for resource in descriptor.resources() {
            if let Err(e) = resource.resolve_with(loader.locator()) {
                invalid += 1;
                println!("error   module {}: {}", descriptor.id(), e);
            }
        }
    }

    if invalid > 0 {
        bail!("{} invalid manifests", invalid);
    }
    Ok(())
}
