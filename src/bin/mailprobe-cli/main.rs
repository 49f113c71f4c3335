mod args;
mod output;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use mailprobe_lib::{MxStatus, Verifier, check_mx};
use tracing_subscriber::EnvFilter;

use crate::args::{CheckArgs, Cli, Commands, Format};
use crate::output::{CheckReport, MxReport, emit};

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// codes de sortie : 0 délivrable, 2 non délivrable / hôte absent, 1 erreur
fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.cmd {
        Some(Commands::Check(args)) => check(&args, cli.format),
        Some(Commands::Mx { domain }) => {
            let result = check_mx(&domain);
            let found = matches!(result, Ok(MxStatus::Records(_)));
            let failed = result.is_err();
            let report = MxReport::from_result(&domain, result);
            emit(cli.format, &report, MxReport::human_summary)?;
            Ok(match (failed, found) {
                (true, _) => ExitCode::from(1),
                (false, true) => ExitCode::SUCCESS,
                (false, false) => ExitCode::from(2),
            })
        }
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(args: &CheckArgs, format: Format) -> Result<ExitCode> {
    let (local, domain) = split_address(&args.email)?;
    let verifier = build_verifier(args)?;

    let outcome = verifier.check_smtp(domain, local);
    let report = CheckReport::from_outcome(&args.email, &outcome);
    emit(format, &report, CheckReport::human_summary)?;

    Ok(if outcome.is_err() {
        ExitCode::from(1)
    } else if report.deliverable() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn build_verifier(args: &CheckArgs) -> Result<Verifier> {
    let mut verifier = Verifier::new()
        .mx_strategy(args.strategy.into())
        .connect_timeout(Duration::from_millis(args.connect_timeout_ms))
        .operation_timeout(Duration::from_millis(args.timeout_ms))
        .port(args.port);
    if let Some(proxy) = &args.proxy {
        verifier = verifier
            .proxy(proxy)
            .with_context(|| format!("invalid --proxy '{proxy}'"))?;
    }
    if let Some(from) = &args.from_email {
        verifier = verifier.from_email(from.as_str());
    }
    if let Some(helo) = &args.helo {
        verifier = verifier.hello_name(helo.as_str());
    }
    if args.no_catch_all {
        verifier = verifier.disable_catch_all_check();
    }
    Ok(verifier)
}

fn split_address(email: &str) -> Result<(&str, &str)> {
    let email = email.trim();
    let Some((local, domain)) = email.rsplit_once('@') else {
        bail!("'{email}' is not an e-mail address (missing '@')");
    };
    if domain.is_empty() {
        bail!("'{email}' has an empty domain");
    }
    Ok((local, domain))
}
