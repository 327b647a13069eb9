use super::args::{Cli, Command};
use crate::prompt::TermPrompter;

pub mod launch;
pub mod relaunch;
pub mod summarize;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let prompter = TermPrompter;
    match cli.cmd {
        Command::Launch(args) => launch::run(args, &prompter),
        Command::Relaunch(args) => relaunch::run(args, &prompter),
        Command::Summarize(args) => summarize::run(args),
    }
}
