use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use optimagick_core::{
    load_config, load_config_from_env, validate_config, Config, IdentifyValidator,
    LocalFilesystem, MagickInvoker, MagickProcessor, OptimizePipeline, PathLocator,
};

/// Optimize images in place with ImageMagick and write WebP/AVIF derivatives.
#[derive(Debug, Parser)]
#[command(name = "optimagick", version, about)]
struct Cli {
    /// Configuration file. Defaults plus OPTIMAGICK_* variables when omitted.
    #[arg(short, long, env = "OPTIMAGICK_CONFIG")]
    config: Option<PathBuf>,

    /// Print the convert commands for each image and exit without running them.
    #[arg(long)]
    print_commands: bool,

    /// Images to optimize.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[tokio::main]
async fn main() {
    match run(Cli::parse()).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load(cli.config.as_deref())?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Convert binary: {:?}", config.magick.convert_path);
    info!("Processors: {}", config.processors.len());

    let processors = build_processors(&config);

    if cli.print_commands {
        for image in &cli.images {
            for processor in &processors {
                let commands = processor
                    .commands(image)
                    .with_context(|| format!("Failed to build commands for {:?}", image))?;
                println!("{}", commands.primary().to_shell_string());
                for (_, spec) in commands.variants() {
                    println!("{}", spec.to_shell_string());
                }
            }
        }
        return Ok(true);
    }

    let mut pipeline = OptimizePipeline::new(
        config.pipeline.clone(),
        Arc::new(IdentifyValidator::new(&config.magick)),
        Arc::new(LocalFilesystem::new(config.placer.clone())),
    );
    for processor in processors {
        pipeline = pipeline.with_processor(processor);
    }

    let mut all_succeeded = true;
    for image in &cli.images {
        match pipeline.run(image).await {
            Ok(mut report) => {
                for derivative in &report.derivatives {
                    info!("Wrote {:?}", derivative);
                }
                if !report.succeeded {
                    warn!("Optimizing {:?} did not fully succeed", image);
                }
                all_succeeded &= report.succeeded;
                if let Err(e) = report.cleanup() {
                    warn!("Failed to remove scratch directory: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to optimize {:?}: {}", image, e);
                all_succeeded = false;
            }
        }
    }

    Ok(all_succeeded)
}

fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => load_config_from_env().context("Failed to load config from environment"),
    }
}

fn build_processors(config: &Config) -> Vec<Arc<MagickProcessor>> {
    let invoker = Arc::new(MagickInvoker::new(&config.magick));
    let locator = Arc::new(PathLocator::new());

    config
        .processors
        .iter()
        .map(|options| {
            Arc::new(
                MagickProcessor::new(options.clone(), invoker.clone())
                    .with_executable(config.magick.convert_path.clone())
                    .with_locator(locator.clone()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "optimagick",
            "--config",
            "/etc/optimagick.toml",
            "--print-commands",
            "a.jpg",
            "b.png",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/optimagick.toml")));
        assert!(cli.print_commands);
        assert_eq!(cli.images, vec![PathBuf::from("a.jpg"), PathBuf::from("b.png")]);
    }

    #[test]
    fn test_images_required() {
        assert!(Cli::try_parse_from(["optimagick"]).is_err());
    }

    #[test]
    fn test_build_processors_from_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[magick]
convert_path = "/opt/im/convert"

[[processors]]
quality = 80

[[processors]]
webp_enable = false
"#
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        let processors = build_processors(&config);

        assert_eq!(processors.len(), 2);
        assert!(!processors[1].config().webp_enable);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load(Some(Path::new("/nonexistent/optimagick.toml"))).is_err());
    }
}
