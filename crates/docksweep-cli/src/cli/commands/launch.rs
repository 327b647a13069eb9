use std::fs;

use anyhow::Context;
use tracing::info;

use crate::cli::args::LaunchArgs;
use crate::exit_codes;
use crate::prompt::Prompter;
use docksweep_core::{jobs, manifest, partition, run_dir, summary};

pub fn run(args: LaunchArgs, prompter: &dyn Prompter) -> anyhow::Result<i32> {
    if !args.protein_path.is_file() {
        eprintln!("error: protein file {} not found", args.protein_path.display());
        return Ok(exit_codes::CONFIG_ERROR);
    }
    if !args.ligand_dir.is_dir() {
        eprintln!("error: ligand directory {} not found", args.ligand_dir.display());
        return Ok(exit_codes::CONFIG_ERROR);
    }
    if !args.image.is_file() {
        eprintln!(
            "error: container image {} not found; download or build it before launching",
            args.image.display()
        );
        return Ok(exit_codes::CONFIG_ERROR);
    }
    if args.jobs == 0 {
        eprintln!("error: job count must be a positive integer");
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let items = manifest::discover_ligands(&args.ligand_dir)?;
    if items.is_empty() {
        eprintln!(
            "error: no ligand files (*.sdf, *.mol2) found in {}",
            args.ligand_dir.display()
        );
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let run_root = run_dir::dated_run_dir(&args.out_dir);
    if run_root.is_dir() {
        println!(
            "The directory {} already exists. To continue it must be removed.",
            run_root.display()
        );
        let remove = args.yes || prompter.confirm("Do you want to remove it?")?;
        if !remove {
            println!("Exiting without launching any jobs.");
            return Ok(exit_codes::SUCCESS);
        }
        fs::remove_dir_all(&run_root)
            .with_context(|| format!("failed to remove {}", run_root.display()))?;
    }
    let dirs = run_dir::create_run_tree(&run_root)?;

    // The manifests reference the copied protein, so the run directory is
    // self-contained once created.
    let protein_name = args
        .protein_path
        .file_name()
        .context("protein path has no file name")?;
    let protein = dirs.root.join(protein_name);
    fs::copy(&args.protein_path, &protein).with_context(|| {
        format!(
            "failed to copy {} into {}",
            args.protein_path.display(),
            dirs.root.display()
        )
    })?;

    let job_count = if args.no_slurm { 1 } else { args.jobs };
    let chunks = partition::split_items(&items, job_count);
    if chunks.len() < job_count {
        println!(
            "More jobs requested than ligands; launching {} single-ligand job(s) instead",
            chunks.len()
        );
    }

    let cores = args.cores.unwrap_or(if args.gpu { 1 } else { 4 });
    let worker_opts = jobs::WorkerOptions {
        image: args.image.clone(),
        samples_per_complex: args.samples_per_complex,
        seed: args.seed,
        model: args.model.clone(),
        cores,
        gpu: args.gpu,
        remove_hs: args.remove_hs,
        rigid_protein: args.rigid_protein,
        relax: args.relax,
        save_visualisation: args.save_visualisation,
        keep_local_structures: args.keep_local_structures,
        keep_cache: args.keep_cache,
        no_final_step_noise: args.no_final_step_noise,
    };
    let resources = jobs::SlurmResources {
        mem: args.mem.clone(),
        cores,
        gpu: args.gpu,
        time: args.time.clone(),
        queue: args.queue.clone(),
    };

    if !args.no_slurm && !args.dry_run {
        println!("Launching jobs..");
    }

    let mut job_ids: Vec<String> = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let idx = i + 1;
        let manifest_path = dirs.csvs.join(format!("job_csv_{idx}.csv"));
        manifest::write_manifest(&manifest_path, &protein, chunk)?;

        let worker = jobs::worker_command(&manifest_path, &dirs.root, &worker_opts);
        let command = if args.no_slurm {
            format!(
                "{worker} 2>&1 | tee {}/jobs_out/job_{idx}.out",
                dirs.root.display()
            )
        } else {
            jobs::sbatch_command(
                &worker,
                "docksweep",
                &format!("{}/jobs_out/job_{idx}_%j.out", dirs.root.display()),
                &resources,
                &[],
            )
        };
        jobs::record_script(&dirs.jobs.join(format!("job_{idx}.sh")), &command)?;

        if args.dry_run {
            continue;
        }
        if args.no_slurm {
            info!(job = idx, "running worker locally");
            jobs::run_local(&command)?;
        } else {
            match jobs::submit(&command) {
                Ok(id) => {
                    println!("Submitted batch job {id}");
                    job_ids.push(id);
                }
                Err(e) => {
                    eprintln!("error: failed to submit job {idx}: {e}");
                    return Ok(exit_codes::SUBMIT_FAILED);
                }
            }
        }
    }

    if args.dry_run {
        println!(
            "Dry run: wrote {} manifest(s) and job script(s) under {}",
            chunks.len(),
            dirs.root.display()
        );
        return Ok(exit_codes::SUCCESS);
    }

    if args.no_summary {
        println!("Finished launching {} job(s) in total", chunks.len());
        return Ok(exit_codes::SUCCESS);
    }

    if args.no_slurm {
        // Workers ran synchronously, so the results are already on disk.
        let count = summary::summarize_run(&dirs.root)?;
        println!("Finished summarizing results ({count} scored structures)");
    } else {
        // The aggregation job waits on every chunk job through the
        // scheduler's dependency mechanism.
        let exe = std::env::current_exe()
            .context("cannot locate own executable for the post-processing job")?;
        let summarize_cmd = format!("{} summarize {}", exe.display(), dirs.root.display());
        let post_resources = jobs::SlurmResources {
            mem: args.mem.clone(),
            cores: 1,
            gpu: false,
            time: None,
            queue: args.queue.clone(),
        };
        let command = jobs::sbatch_command(
            &summarize_cmd,
            "docksweep-postprocess",
            &format!("{}/jobs_out/summarize_results_%j.out", dirs.root.display()),
            &post_resources,
            &job_ids,
        );
        jobs::record_script(&dirs.jobs.join("job_summarize_results.sh"), &command)?;

        println!("Launching post-processing job");
        match jobs::submit(&command) {
            Ok(id) => println!("Submitted batch job {id}"),
            Err(e) => {
                eprintln!("error: failed to submit the post-processing job: {e}");
                return Ok(exit_codes::SUBMIT_FAILED);
            }
        }
        println!("Finished launching {}+1 jobs in total", job_ids.len());
    }

    Ok(exit_codes::SUCCESS)
}
