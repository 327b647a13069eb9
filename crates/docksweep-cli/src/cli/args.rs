use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "docksweep",
    version,
    about = "Batch virtual screening on an HPC scheduler — split a ligand library into jobs, relaunch what failed, rank the results"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Split a ligand library into jobs and launch a new run
    Launch(LaunchArgs),
    /// Detect compounds a run failed to process and relaunch them
    Relaunch(RelaunchArgs),
    /// Rank every scored result of a run into summary_results.csv
    Summarize(SummarizeArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct LaunchArgs {
    /// Path to the protein/receptor .pdb file
    #[arg(long, short = 'p')]
    pub protein_path: PathBuf,

    /// Directory of separate mol2/sdf ligand files
    #[arg(long, short = 'l')]
    pub ligand_dir: PathBuf,

    /// Output name; the run directory is derived from it with a date stamp
    #[arg(long, short = 'o')]
    pub out_dir: PathBuf,

    /// Number of jobs to split the ligand library across
    #[arg(long, short = 'j')]
    pub jobs: usize,

    /// Time limit per job, in the scheduler's format
    #[arg(long)]
    pub time: Option<String>,

    /// Queue/partition to submit to (scheduler default when omitted)
    #[arg(long)]
    pub queue: Option<String>,

    /// Memory per job
    #[arg(long, default_value = "4G")]
    pub mem: String,

    /// Use GPU resources; accelerates docking when a compatible GPU exists
    #[arg(long)]
    pub gpu: bool,

    /// Cores per job (default: 1 with --gpu, otherwise 4)
    #[arg(long, short = 'c')]
    pub cores: Option<u32>,

    /// Seed forwarded to the worker
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// How many structures to output per compound
    #[arg(long, short = 'n', default_value_t = 1)]
    pub samples_per_complex: u32,

    /// Save a pdb with every step of the reverse diffusion
    #[arg(long)]
    pub save_visualisation: bool,

    /// Keep the protein structure rigid
    #[arg(long)]
    pub rigid_protein: bool,

    /// Relax the final structures
    #[arg(long)]
    pub relax: bool,

    /// Use no noise in the final step of the reverse diffusion
    #[arg(long)]
    pub no_final_step_noise: bool,

    /// Model checkpoint to dock with
    #[arg(
        long,
        default_value = "ema_inference_epoch314_model.pt",
        value_parser = ["ema_inference_epoch314_model.pt", "pro_ema_inference_epoch138_model.pt"]
    )]
    pub model: String,

    /// Remove the hydrogens in the final output structures
    #[arg(long)]
    pub remove_hs: bool,

    /// Keep input 3D coordinates instead of regenerating them
    #[arg(long)]
    pub keep_local_structures: bool,

    /// Keep the worker's cache directories after finishing
    #[arg(long)]
    pub keep_cache: bool,

    /// Container image the worker runs in
    #[arg(long, default_value = "singularity/DynamicBindHPC.sif")]
    pub image: PathBuf,

    /// Run in the foreground without the scheduler (forces a single job)
    #[arg(long)]
    pub no_slurm: bool,

    /// Skip the post-processing job that ranks all results
    #[arg(long)]
    pub no_summary: bool,

    /// Write manifests and job scripts but submit nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Assume yes when asked to remove an existing run directory
    #[arg(long)]
    pub yes: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RelaunchArgs {
    /// Run directory of the original launch
    pub run_dir: PathBuf,

    /// Number of redo jobs to launch (prompts when omitted)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Remove an existing redo/ directory without asking
    #[arg(long)]
    pub yes: bool,

    /// Plan and write the redo tree but submit nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SummarizeArgs {
    /// Run directory to aggregate
    pub run_dir: PathBuf,
}
