use crate::cli::args::SummarizeArgs;
use crate::exit_codes;
use docksweep_core::summary;

pub fn run(args: SummarizeArgs) -> anyhow::Result<i32> {
    if !args.run_dir.is_dir() {
        eprintln!("error: {} is not a directory", args.run_dir.display());
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let count = summary::summarize_run(&args.run_dir)?;
    println!("Finished summarizing results ({count} scored structures)");
    Ok(exit_codes::SUCCESS)
}
