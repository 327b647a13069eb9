use clap::Parser;

mod cli;
mod exit_codes;
mod prompt;

use cli::args::Cli;
use cli::commands::dispatch;

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
    let cli = Cli::parse();
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}
