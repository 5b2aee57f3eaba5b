use anyhow::{bail, Context, Result};
use clap::Parser;

use hilite::cli::{self, CliArgs, Command, OutputFormat};
use hilite::config::HighlightConfig;
use hilite::syntax::{DocumentId, HighlightEngine, HighlightSession};

fn main() -> Result<()> {
    let args = CliArgs::parse();
    hilite::tracing::init(args.verbose);

    let config = match &args.config {
        Some(path) => HighlightConfig::load_from(path),
        None => HighlightConfig::load(),
    };
    let engine = HighlightEngine::from_config(&config);

    match args.command {
        Command::Highlight {
            path,
            language,
            format,
        } => {
            let language = cli::resolve_language(&path, language.as_deref(), &config)
                .map_err(anyhow::Error::msg)?;
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let (mut session, cmd) =
                HighlightSession::attach(DocumentId(0), language, source.as_str(), &engine)
                    .with_context(|| format!("Cannot highlight {}", path.display()))?;
            session.run_to_completion(cmd, &engine);

            if let Some(reason) = session.disabled_reason() {
                eprintln!("warning: highlighting disabled: {}", reason);
            }

            let decorations = session.decorations();
            match format {
                OutputFormat::Text => print!("{}", cli::render_text(&decorations, &source)),
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&*decorations)
                        .context("Failed to serialize decorations")?;
                    println!("{}", json);
                }
            }
        }
        Command::Languages => {
            let catalog = engine.parsers().catalog();
            for language in catalog.languages() {
                let locator = catalog
                    .locate(language)
                    .map(|artifact| artifact.to_string())
                    .unwrap_or_default();
                let status = if config.is_disabled(language) {
                    "disabled"
                } else {
                    "enabled"
                };
                println!(
                    "{:<12} {:<12} {:<24} {}",
                    language.name(),
                    language.display_name(),
                    locator,
                    status
                );
            }
        }
        Command::Check => {
            let mut failures = 0;
            for (language, result) in engine.self_check() {
                match result {
                    Ok(patterns) => println!("{:<12} ok ({} patterns)", language.name(), patterns),
                    Err(e) => {
                        failures += 1;
                        println!("{:<12} FAILED: {}", language.name(), e);
                    }
                }
            }
            if failures > 0 {
                bail!("{} language(s) failed the check", failures);
            }
        }
    }

    Ok(())
}
