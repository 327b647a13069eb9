//! Building, recording and submitting worker job commands.
//!
//! Each chunk becomes one shell command: the containerized worker invoked
//! with the chunk's manifest, optionally wrapped in an `sbatch` submission
//! carrying the resource parameters. Every command is recorded to a script
//! under `jobs/` before it is executed or submitted, so a run directory
//! always documents exactly what was launched.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Shared options forwarded verbatim to every worker invocation of a run.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Container image the worker runs in.
    pub image: PathBuf,
    /// Structures to output per compound.
    pub samples_per_complex: u32,
    pub seed: u64,
    /// Model checkpoint selector.
    pub model: String,
    /// Cores per job, also forwarded to the scheduler.
    pub cores: u32,
    pub gpu: bool,
    /// Remove hydrogens from the final output structures.
    pub remove_hs: bool,
    /// Keep the protein rigid instead of letting it move.
    pub rigid_protein: bool,
    /// Relax the final structures.
    pub relax: bool,
    /// Save a per-step visualisation of the reverse diffusion.
    pub save_visualisation: bool,
    /// Keep 3D coordinates from the input instead of regenerating them.
    pub keep_local_structures: bool,
    /// Keep the worker's cache directories after finishing.
    pub keep_cache: bool,
    /// Skip the noise-free final diffusion step.
    pub no_final_step_noise: bool,
}

/// Resource parameters attached to a scheduler submission.
#[derive(Debug, Clone)]
pub struct SlurmResources {
    pub mem: String,
    pub cores: u32,
    pub gpu: bool,
    pub time: Option<String>,
    pub queue: Option<String>,
}

/// Renders the containerized worker invocation for one chunk. The option
/// spellings are the worker's wire format and are forwarded verbatim.
pub fn worker_command(manifest: &Path, out_dir: &Path, opts: &WorkerOptions) -> String {
    let mut parts: Vec<String> = vec!["singularity".into(), "exec".into()];
    if opts.gpu {
        parts.push("--nv".into());
    }
    parts.extend([
        "--bind".into(),
        "$PWD".into(),
        opts.image.display().to_string(),
        "python3".into(),
        "-u".into(),
        "inference.py".into(),
        "--protein_ligand_csv".into(),
        manifest.display().to_string(),
        "--samples_per_complex".into(),
        opts.samples_per_complex.to_string(),
    ]);
    if opts.remove_hs {
        parts.push("--remove_output_hs".into());
    }
    // The worker treats a movable protein as the special case, so the flag
    // is emitted unless the caller pinned the structure.
    if !opts.rigid_protein {
        parts.push("--protein_dynamic".into());
    }
    if opts.relax {
        parts.push("--relax".into());
    }
    parts.extend(["--out_dir".into(), out_dir.display().to_string()]);
    if opts.save_visualisation {
        parts.extend([
            "--save_visualisation".into(),
            "--savings_per_complex".into(),
            opts.samples_per_complex.to_string(),
        ]);
    }
    if opts.keep_local_structures {
        parts.push("--keep_local_structures".into());
    }
    if !opts.keep_cache {
        parts.push("--delete_cache".into());
    }
    if !opts.no_final_step_noise {
        parts.push("--no_final_step_noise".into());
    }
    parts.extend([
        "-c".into(),
        opts.cores.to_string(),
        "--seed".into(),
        opts.seed.to_string(),
        "--ckpt".into(),
        opts.model.clone(),
    ]);
    parts.join(" ")
}

/// Wraps a worker command in an `sbatch` submission. `dependencies` wires
/// the job to run only after the listed job ids succeed (the aggregation
/// step waits on every chunk job this way).
pub fn sbatch_command(
    worker_cmd: &str,
    job_name: &str,
    output_log: &str,
    res: &SlurmResources,
    dependencies: &[String],
) -> String {
    let mut cmd = format!(
        "sbatch --wrap=\"{worker_cmd}\" --mem {} --output={output_log}",
        res.mem
    );
    if res.gpu {
        cmd.push_str(" --gres=gpu:1");
    }
    cmd.push_str(&format!(" --job-name={job_name} -c {}", res.cores));
    if let Some(time) = &res.time {
        cmd.push_str(&format!(" --time {time}"));
    }
    if let Some(queue) = &res.queue {
        cmd.push_str(&format!(" -p {queue}"));
    }
    if !dependencies.is_empty() {
        cmd.push_str(&format!(" --dependency=afterok:{}", dependencies.join(",")));
    }
    cmd
}

/// Records a command as a shell script, shebang first, command second.
/// Scripts are written before submission so the run directory stays
/// auditable even when a submission fails.
pub fn record_script(path: &Path, cmd: &str) -> Result<()> {
    fs::write(path, format!("#!/usr/bin/env bash\n{cmd}\n"))
        .map_err(|e| Error::io("write", path, e))
}

/// Submits a command through the shell and returns the scheduler's opaque
/// job id, taken from the last whitespace-separated token of the
/// submission's stdout (`Submitted batch job <id>`).
pub fn submit(cmd: &str) -> Result<String> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .output()
        .map_err(|e| Error::Submission {
            detail: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::Submission {
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!(%stdout, "scheduler submission output");
    stdout
        .split_whitespace()
        .last()
        .map(str::to_string)
        .ok_or(Error::MissingJobId { stdout })
}

/// Runs a command in the foreground with inherited stdio (local mode,
/// no scheduler). A non-zero worker exit is reported but not fatal; the
/// run directory is inspected afterwards either way.
pub fn run_local(cmd: &str) -> Result<()> {
    let status = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .status()
        .map_err(|e| Error::Submission {
            detail: e.to_string(),
        })?;
    if !status.success() {
        warn!(%status, "local worker invocation exited non-zero");
    }
    Ok(())
}
