mod config;
mod error;
mod routes;
mod zebra;

use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use config::{CliArgs, Config};
use error::{ZrouteError, ZrouteResult};
use routes::addr::SystemInterfaces;
use routes::parser::parse_tokens;
use zebra::message::RouteMessage;
use zebra::session::Session;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli_args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                // --help and --version
                ExitCode::SUCCESS
            };
        }
    };

    let config = match Config::load(&cli_args) {
        Ok(config) => config,
        Err(e) => return report(&e),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(config.log_level).into())
                .from_env_lossy(),
        )
        .init();

    if let Some(path) = &config.source {
        tracing::debug!("Loaded configuration from: {}", path.display());
    }

    match run(&cli_args.tokens, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

async fn run(tokens: &[String], config: &Config) -> ZrouteResult<()> {
    let request = parse_tokens(tokens, config)?;
    tracing::debug!("Request: {}", request);

    let message = RouteMessage::from_request(&request, &SystemInterfaces);

    let mut session = Session::connect(config).await?;

    let ret = session.submit(&message).await;
    if ret != 0 {
        return Err(ZrouteError::RouteRequest {
            op: request.operation.progressive(),
            code: ret,
        });
    }

    if let Err(e) = session.drain().await {
        tracing::warn!("No reply from zebra routing daemon: {}", e);
    }

    session.close().await;
    tracing::debug!("Session {:?}", session.state());
    Ok(())
}

fn report(err: &ZrouteError) -> ExitCode {
    eprintln!("zroute: {err}");
    if err.is_usage() {
        eprintln!("{}", CliArgs::command().render_usage());
    }
    ExitCode::from(err.exit_code())
}
