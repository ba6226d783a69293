use anyhow::Result;
use clap::Parser;

use subtl_cli::cli::commands::{ConfigError, configure, providers, translate};
use subtl_cli::cli::{Args, Command};
use subtl_cli::config::ResolveOptions;
use subtl_cli::credentials::CredentialError;
use subtl_cli::job::JobError;
use subtl_cli::output::{self, OutputConfig};
use subtl_cli::ui::Style;

/// Exit status after the user interrupted a job.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    output::init(OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        no_color: args.no_color || std::env::var("NO_COLOR").is_ok(),
    });

    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", Style::error("Error:"));
            exit_code_for(&e)
        }
    };

    std::process::exit(code);
}

async fn run(args: Args) -> Result<i32> {
    match args.command {
        Some(Command::Configure) => {
            configure::run_configure().map_err(ConfigError)?;
        }
        Some(Command::Providers { provider, check }) => {
            providers::print_providers(provider.as_deref(), check).await?;
        }
        None => {
            let options = translate::TranslateOptions {
                file: args.file,
                resolve: ResolveOptions {
                    to: args.to,
                    from: args.from,
                    provider: args.provider,
                    model: args.model,
                    temperature: args.temperature,
                    batch_size: args.batch_size,
                    duplicates: args.duplicates,
                    no_balance: args.no_balance,
                },
                output_dir: args.output_dir,
                no_cache: args.no_cache,
            };
            let summary = translate::run_translate(options).await?;
            if summary.cancelled {
                return Ok(EXIT_INTERRUPTED);
            }
        }
    }

    Ok(exitcode::OK)
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<ConfigError>().is_some() {
        return exitcode::CONFIG;
    }
    if error.downcast_ref::<CredentialError>().is_some() {
        return exitcode::NOPERM;
    }
    match error.downcast_ref::<JobError>() {
        Some(JobError::Io { .. }) => exitcode::IOERR,
        Some(JobError::Credential(_)) => exitcode::NOPERM,
        Some(JobError::Payload(_)) => exitcode::DATAERR,
        Some(JobError::Http(_)) => exitcode::UNAVAILABLE,
        None => exitcode::SOFTWARE,
    }
}
