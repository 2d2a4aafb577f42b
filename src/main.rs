mod circle;
mod cli;
mod config;
mod error;
mod git;
mod resolver;
mod runner;
mod ui;

use std::io::Write;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use cli::Cli;
use tracing::info;
use tracing_subscriber::EnvFilter;

use circle::CircleClient;
use config::{CartConfig, Settings};
use error::CartError;
use runner::{RunOutcome, Runner};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Written directly so no log filter can swallow it.
            let _ = report(&err, &mut std::io::stderr().lock());
            ExitCode::FAILURE
        }
    }
}

/// Writes the fatal error, followed by usage text for flag problems.
fn report(err: &CartError, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Error: {err}")?;
    if err.shows_usage() {
        writeln!(out)?;
        write!(out, "{}", Cli::command().render_help())?;
    }
    out.flush()
}

async fn run(cli: Cli) -> Result<(), CartError> {
    let config = CartConfig::load()?;
    let detected = if cli.repo.is_none() {
        std::env::current_dir()
            .ok()
            .and_then(|dir| git::detect_project(&dir))
    } else {
        None
    };
    let settings = Settings::resolve(cli, config, detected)?;

    let client = CircleClient::with_base_url(settings.token.clone(), &settings.base_url)?;
    let outcome = Runner::new(&client, &settings).run().await?;

    match outcome {
        RunOutcome::Listed { build_num } => info!("Listed artifacts of build {build_num}"),
        RunOutcome::DryRun { build_num, url } => {
            info!(url = %url, "Dry run complete for build {build_num}")
        }
        RunOutcome::Downloaded {
            build_num,
            bytes,
            path,
        } => info!(bytes, path = %path.display(), "Downloaded from build {build_num}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(err: &CartError) -> String {
        let mut out = Vec::new();
        report(err, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn credential_error_is_reported_without_usage() {
        let text = render(&CartError::Credential);
        assert_eq!(
            text,
            "Error: no auth token set: use $CIRCLE_TOKEN or flag --token\n"
        );
    }

    #[test]
    fn config_error_is_followed_by_usage() {
        let text = render(&CartError::Config("no <artifact> provided".into()));
        assert!(text.starts_with("Error: no <artifact> provided\n\n"));
        assert!(text.contains("Usage: cart"));
        assert!(text.contains("--search-depth"));
    }

    #[test]
    fn not_found_error_is_reported() {
        let text = render(&CartError::ArtifactNotFound("out.tar.gz".into()));
        assert_eq!(text, "Error: unable to find artifact: out.tar.gz\n");
    }
}
