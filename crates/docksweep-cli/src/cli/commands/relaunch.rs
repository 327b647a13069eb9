use std::fs;

use anyhow::Context;

use crate::cli::args::RelaunchArgs;
use crate::exit_codes;
use crate::prompt::Prompter;
use docksweep_core::{failures, jobs, manifest, redo, scan};

pub fn run(args: RelaunchArgs, prompter: &dyn Prompter) -> anyhow::Result<i32> {
    let run_dir = &args.run_dir;
    if !run_dir.is_dir() {
        eprintln!("error: {} is not a valid run directory", run_dir.display());
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let submitted = manifest::read_manifests(&run_dir.join("csvs"))?;
    let finished = scan::finished_items(run_dir)?;
    let report = failures::failure_report(submitted, &finished);

    println!("Total compounds: {}", report.total);
    println!(
        "Successfully processed: {}/{} ({:.1}%)",
        report.completed,
        report.total,
        report.completed_pct()
    );
    println!(
        "Failed to process: {}/{} ({:.1}%)",
        report.failed_count(),
        report.total,
        report.failed_pct()
    );

    if report.failed.is_empty() {
        println!("All compounds processed successfully! No jobs to relaunch.");
        return Ok(exit_codes::SUCCESS);
    }

    let job_count = match args.jobs {
        Some(count) => count,
        None => match prompter.job_count()? {
            Some(count) => count,
            None => {
                println!("Exiting without launching any jobs.");
                return Ok(exit_codes::SUCCESS);
            }
        },
    };
    if job_count == 0 {
        eprintln!("error: job count must be a positive integer");
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let redo_dir = run_dir.join("redo");
    if redo_dir.exists() {
        println!(
            "The directory {} already exists. To continue it must be removed.",
            redo_dir.display()
        );
        let remove = args.yes || prompter.confirm("Do you want to remove it?")?;
        if !remove {
            println!("Exiting without relaunching jobs.");
            return Ok(exit_codes::SUCCESS);
        }
        fs::remove_dir_all(&redo_dir)
            .with_context(|| format!("failed to remove {}", redo_dir.display()))?;
    }

    let plan = redo::plan_redo(run_dir, &report.failed, job_count)?;
    println!(
        "Prepared {} redo job(s) under {}",
        plan.jobs.len(),
        plan.redo_dir.display()
    );

    if args.dry_run {
        println!("Dry run: manifests and job scripts were written, nothing was submitted.");
        return Ok(exit_codes::SUCCESS);
    }

    // Redo runs have no downstream dependency to wire, so the scheduler's
    // job ids are reported but not accumulated.
    for job in &plan.jobs {
        // A local-mode template has no scheduler wrapper and produces no
        // job id; it runs in the foreground instead.
        if job.command.starts_with("sbatch") {
            match jobs::submit(&job.command) {
                Ok(id) => println!("Submitted batch job {id}"),
                Err(e) => {
                    eprintln!("error: failed to submit {}: {e}", job.script.display());
                    return Ok(exit_codes::SUBMIT_FAILED);
                }
            }
        } else {
            jobs::run_local(&job.command)?;
        }
    }

    println!("Finished launching {} redo job(s) in total", plan.jobs.len());
    Ok(exit_codes::SUCCESS)
}
