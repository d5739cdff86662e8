use std::process::ExitCode;

fn main() -> ExitCode {
    snapshop_cli::run()
}
