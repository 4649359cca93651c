use std::process::ExitCode;

fn main() -> ExitCode {
    marquee_cli::run()
}
