//! PANDA installer CLI entrypoint.
//!
//! Stages PANDA build outputs into the Python package data directory and
//! drives the Python installer in distribution or development mode.

use clap::Parser;
use panda_installer::cli::Cli;
use panda_installer::commands::run;
use panda_installer::error::Result;
use panda_installer::exec::SystemCommandExecutor;
use panda_installer::logging;
use panda_installer::output::write_stderr_line;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.global.verbosity, cli.global.quiet);

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &SystemCommandExecutor, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use panda_installer::error::{InstallerError, RUN_BUILD_FIRST};

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = InstallerError::MissingArtefact {
            path: Utf8PathBuf::from("/src/panda/build/arm-softmmu/libpanda-arm.so"),
            hint: RUN_BUILD_FIRST,
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("error: missing file /src/panda/build/arm-softmmu/libpanda-arm.so"));
        assert!(stderr_text.contains("did you run build.sh"));
    }
}
