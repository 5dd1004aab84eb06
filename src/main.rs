//! Oncoscreen: breast cancer risk-factor screening
//!
//! Main entry point for the command-line application.

use anyhow::Result;
use std::io::{IsTerminal, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oncoscreen::adapters::sanitize::SanitizingMakeWriter;
use oncoscreen::cli::{self, App};
use oncoscreen::config::Config;

fn main() -> Result<()> {
    let invocation = match cli::parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e}\n\n{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    let config = Config::from_env();

    // Initialize logging.
    //
    // stdout carries command output, so logs never go there:
    // - interactive TTY: log to a file
    // - non-interactive: log to stderr
    let interactive = std::io::stdout().is_terminal();
    let (writer, _guard) = if config.log_mode.use_file(interactive) {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    for warning in &config.warnings {
        tracing::warn!("{warning}");
    }
    tracing::debug!("Using database {}", config.db_path.display());

    let app = App::new(&config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app.run(invocation, &mut out)?;
    out.flush()?;

    Ok(())
}
