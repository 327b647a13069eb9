//! Redo planning: re-partitioning the failed set into a fresh batch of
//! manifests and job scripts under `redo/`.
//!
//! The redo tree mirrors a fresh run directory and is always created from
//! scratch; an existing `redo/` is never merged into. That existence check
//! doubles as the mutual-exclusion guard against two concurrent redos of
//! the same run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::jobs::record_script;
use crate::manifest::{write_manifest, WorkItem};
use crate::partition::split_items;
use crate::template::JobTemplate;

/// One planned redo job: its recorded script and the command to submit.
#[derive(Debug)]
pub struct RedoJob {
    pub script: PathBuf,
    pub command: String,
}

/// A fully written redo plan, ready for submission.
#[derive(Debug)]
pub struct RedoPlan {
    pub redo_dir: PathBuf,
    pub jobs: Vec<RedoJob>,
}

/// Re-partitions `failed` into `job_count` chunks and writes a manifest
/// and job script per chunk under `run_dir/redo/`. Each script is derived
/// from the first job script of the original run: the manifest path and
/// the output-log path are substituted, everything else (resources,
/// model, sample count, seed, container invocation) carries over
/// unchanged, so redo jobs are configuration-identical to the original
/// run except for input scope and output location.
///
/// Fails without touching the filesystem when `redo/` already exists,
/// when no original job script can serve as a template, or when the run's
/// protein file is missing. Callers decide whether to remove a stale
/// `redo/` (with operator confirmation) and retry.
pub fn plan_redo(run_dir: &Path, failed: &[WorkItem], job_count: usize) -> Result<RedoPlan> {
    let redo_dir = run_dir.join("redo");
    if redo_dir.exists() {
        return Err(Error::DirectoryExists { path: redo_dir });
    }

    let template_path = find_job_template(&run_dir.join("jobs"))?;
    let template = JobTemplate::from_script(&template_path)?;
    let protein = find_protein(run_dir)?;

    let csvs_dir = redo_dir.join("csvs");
    let jobs_dir = redo_dir.join("jobs");
    for dir in [&redo_dir, &csvs_dir, &jobs_dir, &redo_dir.join("jobs_out")] {
        fs::create_dir(dir).map_err(|e| Error::io("create", dir, e))?;
    }

    let mut jobs = Vec::new();
    for (i, chunk) in split_items(failed, job_count).iter().enumerate() {
        let idx = i + 1;
        let manifest_path = csvs_dir.join(format!("job_csv_{idx}.csv"));
        write_manifest(&manifest_path, &protein, chunk)?;

        let mut cmd = template.clone();
        cmd.set_option_value("--protein_ligand_csv", &manifest_path.display().to_string());
        let rewrote_log = cmd.set_assignment(
            "--output=",
            &format!("{}/redo/jobs_out/redo_job_{idx}_%j.out", run_dir.display()),
        );
        if !rewrote_log {
            // Local-mode template: the log goes through `tee` instead.
            cmd.set_option_value(
                "tee",
                &format!("{}/redo/jobs_out/redo_job_{idx}.out", run_dir.display()),
            );
        }

        let script = jobs_dir.join(format!("redo_job_{idx}.sh"));
        let command = cmd.render();
        record_script(&script, &command)?;
        jobs.push(RedoJob { script, command });
    }

    Ok(RedoPlan { redo_dir, jobs })
}

/// First job script of the original run, in sorted name order.
fn find_job_template(jobs_dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(jobs_dir).map_err(|e| Error::io("read", jobs_dir, e))?;

    let mut scripts: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("job_") && name.ends_with(".sh"))
        })
        .collect();
    scripts.sort();

    scripts.into_iter().next().ok_or(Error::MissingJobTemplate {
        jobs_dir: jobs_dir.to_path_buf(),
    })
}

/// The run's protein file: first `*.pdb` directly under the run root.
fn find_protein(run_dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(run_dir).map_err(|e| Error::io("read", run_dir, e))?;

    let mut proteins: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("pdb")
        })
        .collect();
    proteins.sort();

    proteins.into_iter().next().ok_or(Error::MissingProtein {
        dir: run_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::read_manifests;
    use std::collections::HashSet;
    use tempfile::{tempdir, TempDir};

    const TEMPLATE_CMD: &str = "sbatch --wrap=\"singularity exec --bind $PWD image.sif \
python3 -u inference.py --protein_ligand_csv /orig/csvs/job_csv_1.csv \
--samples_per_complex 3 --out_dir /orig --seed 42 --ckpt model.pt\" --mem 4G \
--output=/orig/jobs_out/job_1_%j.out --job-name=docksweep -c 4";

    fn fixture_run() -> TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("jobs")).unwrap();
        fs::write(
            dir.path().join("jobs/job_1.sh"),
            format!("#!/usr/bin/env bash\n{TEMPLATE_CMD}\n"),
        )
        .unwrap();
        fs::write(dir.path().join("receptor.pdb"), b"ATOM\n").unwrap();
        dir
    }

    fn failed_items(names: &[&str]) -> Vec<WorkItem> {
        names
            .iter()
            .map(|name| WorkItem {
                name: name.to_string(),
                ligand: PathBuf::from(format!("/l/{name}.sdf")),
            })
            .collect()
    }

    #[test]
    fn plan_writes_disjoint_manifests_covering_the_failed_set() {
        let run = fixture_run();
        let failed = failed_items(&["B", "D", "E"]);

        let plan = plan_redo(run.path(), &failed, 2).unwrap();
        assert_eq!(plan.jobs.len(), 2);

        let rows = read_manifests(&run.path().join("redo/csvs")).unwrap();
        assert_eq!(rows.len(), 3);
        let names: HashSet<&str> = rows.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, HashSet::from(["B", "D", "E"]));
    }

    #[test]
    fn scripts_substitute_manifest_and_log_but_keep_options() {
        let run = fixture_run();
        let plan = plan_redo(run.path(), &failed_items(&["B"]), 1).unwrap();

        let script = fs::read_to_string(&plan.jobs[0].script).unwrap();
        assert!(script.starts_with("#!/usr/bin/env bash\n"));

        let cmd = &plan.jobs[0].command;
        let new_manifest = run.path().join("redo/csvs/job_csv_1.csv");
        assert!(cmd.contains(&format!("--protein_ligand_csv {}", new_manifest.display())));
        assert!(cmd.contains(&format!(
            "--output={}/redo/jobs_out/redo_job_1_%j.out",
            run.path().display()
        )));
        // Original options carry over untouched.
        assert!(cmd.contains("--samples_per_complex 3"));
        assert!(cmd.contains("--seed 42 --ckpt model.pt"));
        assert!(cmd.contains("--mem 4G"));
        assert!(!cmd.contains("/orig/csvs/"));
    }

    #[test]
    fn local_mode_template_rewrites_the_tee_log() {
        let run = tempdir().unwrap();
        fs::create_dir(run.path().join("jobs")).unwrap();
        fs::write(
            run.path().join("jobs/job_1.sh"),
            "#!/usr/bin/env bash\nsingularity exec --bind $PWD image.sif python3 -u inference.py \
             --protein_ligand_csv /orig/csvs/job_csv_1.csv --out_dir /orig 2>&1 | tee /orig/jobs_out/job_1.out\n",
        )
        .unwrap();
        fs::write(run.path().join("receptor.pdb"), b"ATOM\n").unwrap();

        let plan = plan_redo(run.path(), &failed_items(&["B"]), 1).unwrap();
        assert!(plan.jobs[0].command.contains(&format!(
            "tee {}/redo/jobs_out/redo_job_1.out",
            run.path().display()
        )));
    }

    #[test]
    fn existing_redo_directory_is_refused() {
        let run = fixture_run();
        fs::create_dir(run.path().join("redo")).unwrap();
        assert!(matches!(
            plan_redo(run.path(), &failed_items(&["B"]), 1),
            Err(Error::DirectoryExists { .. })
        ));
    }

    #[test]
    fn missing_template_is_fatal() {
        let run = tempdir().unwrap();
        fs::create_dir(run.path().join("jobs")).unwrap();
        fs::write(run.path().join("receptor.pdb"), b"ATOM\n").unwrap();
        assert!(matches!(
            plan_redo(run.path(), &failed_items(&["B"]), 1),
            Err(Error::MissingJobTemplate { .. })
        ));
    }

    #[test]
    fn missing_protein_is_fatal() {
        let run = tempdir().unwrap();
        fs::create_dir(run.path().join("jobs")).unwrap();
        fs::write(
            run.path().join("jobs/job_1.sh"),
            format!("#!/usr/bin/env bash\n{TEMPLATE_CMD}\n"),
        )
        .unwrap();
        assert!(matches!(
            plan_redo(run.path(), &failed_items(&["B"]), 1),
            Err(Error::MissingProtein { .. })
        ));
    }
}
