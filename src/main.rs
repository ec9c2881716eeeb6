// src/main.rs

use anyhow::Result;
use clap::Parser;
use dirbundle::cli::{Cli, Commands};
use dirbundle::config::{ConfigBuilder, SplitConfig};
use dirbundle::errors::Error;
#[cfg(feature = "progress")]
use dirbundle::progress::IndicatifProgress;
use dirbundle::progress::{LogProgress, ProgressReporter};
use dirbundle::signal::setup_signal_handler;
use dirbundle::utils::format_size;
use dirbundle::{combine, split, AllowOverwrite, ConsolePrompt, OverwritePrompt};
use std::sync::Arc;

fn log_directive(cli: &Cli) -> &'static str {
    if cli.verbose {
        "dirbundle=debug"
    } else if cli.quiet {
        "dirbundle=warn"
    } else if cfg!(debug_assertions) {
        "dirbundle=debug"
    } else {
        "dirbundle=info"
    }
}

fn progress_reporter(quiet: bool) -> Option<Arc<dyn ProgressReporter>> {
    #[cfg(feature = "progress")]
    {
        if !quiet && atty::is(atty::Stream::Stderr) {
            return Some(Arc::new(IndicatifProgress::new()));
        }
    }
    if quiet {
        return None;
    }
    Some(Arc::new(LogProgress::default()))
}

fn run(cli: Cli) -> dirbundle::Result<()> {
    let token = setup_signal_handler().map_err(|e| Error::Io {
        path: "<signal handler>".to_string(),
        source: std::io::Error::other(e.to_string()),
    })?;

    match cli.command {
        Commands::Combine(args) => {
            let config = ConfigBuilder::from_cli(args).build()?;
            log::debug!("Configuration built successfully.");
            let prompt: Box<dyn OverwritePrompt> = if config.output.force {
                Box::new(AllowOverwrite)
            } else {
                Box::new(ConsolePrompt)
            };
            let result = combine(
                &config,
                &token,
                progress_reporter(cli.quiet),
                prompt.as_ref(),
            )?;
            if !config.dry_run {
                log::info!(
                    "Bundled {} file(s) into {} in {:.2?}",
                    result.files_processed,
                    result.output_path.display(),
                    result.elapsed
                );
                if result.encoding_errors > 0 {
                    log::warn!(
                        "{} file(s) were written with encoding replacements",
                        result.encoding_errors
                    );
                }
            }
        }
        Commands::Split(args) => {
            let config = SplitConfig::from_cli(args)?;
            let result = split(&config)?;
            if config.dry_run {
                println!("--- Dry Run: Files that would be extracted ---");
                for path in &result.paths {
                    println!("- {}", path);
                }
                println!("--- End Dry Run: {} file(s) ---", result.paths.len());
            } else {
                let size: u64 = result
                    .paths
                    .iter()
                    .filter_map(|p| std::fs::metadata(config.destination.join(p)).ok())
                    .map(|m| m.len())
                    .sum();
                log::info!(
                    "Extracted {} file(s) ({}) to {}",
                    result.extracted,
                    format_size(size),
                    config.destination.display()
                );
            }
            if result.skipped_existing > 0 {
                log::warn!(
                    "{} existing file(s) were kept; use --force to overwrite",
                    result.skipped_existing
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                log_directive(&cli)
                    .parse()
                    .unwrap_or_else(|_| tracing_subscriber::filter::Directive::from(tracing::Level::INFO)),
            ),
        )
        .init();

    log::debug!("Starting dirbundle v{}...", env!("CARGO_PKG_VERSION"));
    log::debug!("Raw arguments: {:?}", std::env::args().collect::<Vec<_>>());

    // Panic messages must not leak build paths.
    std::panic::set_hook(Box::new(|info| {
        let msg = match info.payload().downcast_ref::<&str>() {
            Some(s) => (*s).to_string(),
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => s.clone(),
                None => "Box<Any>".to_string(),
            },
        };
        eprintln!(
            "Application Error: {}",
            msg.replace(env!("CARGO_MANIFEST_DIR"), "<redacted>")
                .replace(std::path::MAIN_SEPARATOR, "/")
        );
    }));

    if let Err(e) = run(cli) {
        match e {
            Error::Interrupted => {
                eprintln!("\nOperation cancelled.");
                std::process::exit(130);
            }
            Error::NoFilesFound => {
                eprintln!("dirbundle: No files found matching the specified criteria.");
                return Ok(());
            }
            _ => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
