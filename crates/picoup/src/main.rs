//! picoup CLI entry point.

// The binary writes command output to stdout and diagnostics to stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Write;

use miette::Report;
use picoup::cli::{self, EXIT_FAILURE, EXIT_OK, exit_code_for};
use picoup::commands;
use picoup::tracing::{TracingConfig, init_tracing};

fn main() {
    let cli = cli::parse();

    if let Err(e) = init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
        filter: None,
    }) {
        eprintln!("{e:?}");
        std::process::exit(EXIT_FAILURE);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let code = match runtime.block_on(commands::execute(cli.command, &cli.global)) {
        Ok(output) => {
            println!("{output}");
            EXIT_OK
        }
        Err(err) => {
            let code = exit_code_for(&err);
            eprintln!("{:?}", Report::new(err));
            code
        }
    };

    let _ = std::io::stdout().flush();
    std::process::exit(code);
}
