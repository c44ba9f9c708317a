//! shrep command-line front end

use std::process::ExitCode;

use shrep::cli::USAGE;

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,shrep=info")).init();

    let command = match shrep::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            return Ok(ExitCode::from(2));
        }
    };

    shrep::app::run(command)?;
    Ok(ExitCode::SUCCESS)
}
