use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn docksweep() -> Command {
    Command::cargo_bin("docksweep").unwrap()
}

/// Protein, ligand library and a stand-in container image.
fn inputs(dir: &std::path::Path, ligands: &[&str]) -> (PathBuf, PathBuf, PathBuf) {
    let protein = dir.join("receptor.pdb");
    fs::write(&protein, b"ATOM\n").unwrap();

    let ligand_dir = dir.join("ligands");
    fs::create_dir(&ligand_dir).unwrap();
    for name in ligands {
        fs::write(ligand_dir.join(name), b"").unwrap();
    }

    let image = dir.join("worker.sif");
    fs::write(&image, b"").unwrap();
    (protein, ligand_dir, image)
}

/// The dated run directory created under `parent` for an `--out-dir` name.
fn find_run_dir(parent: &std::path::Path, name: &str) -> PathBuf {
    let prefix = format!("VS_DB_{name}_");
    fs::read_dir(parent)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .expect("run directory should have been created")
}

#[test]
fn dry_run_writes_manifests_and_scripts_without_submitting() {
    let dir = tempdir().unwrap();
    let (protein, ligand_dir, image) = inputs(dir.path(), &["L1.sdf", "L2.sdf", "L3.mol2"]);
    let out = dir.path().join("campaign");

    docksweep()
        .arg("launch")
        .args(["--protein-path", protein.to_str().unwrap()])
        .args(["--ligand-dir", ligand_dir.to_str().unwrap()])
        .args(["--out-dir", out.to_str().unwrap()])
        .args(["--jobs", "2"])
        .args(["--image", image.to_str().unwrap()])
        .args(["--samples-per-complex", "3", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    let run = find_run_dir(dir.path(), "campaign");
    for sub in ["csvs", "jobs", "jobs_out"] {
        assert!(run.join(sub).is_dir(), "missing {sub}/");
    }
    assert!(run.join("receptor.pdb").is_file());

    // 3 ligands over 2 jobs: chunk sizes 2 and 1, chunk order preserved.
    let first = fs::read_to_string(run.join("csvs/job_csv_1.csv")).unwrap();
    let second = fs::read_to_string(run.join("csvs/job_csv_2.csv")).unwrap();
    assert_eq!(first.lines().count(), 3);
    assert_eq!(second.lines().count(), 2);
    assert!(first.lines().nth(1).unwrap().starts_with("L1;"));
    assert!(second.lines().nth(1).unwrap().starts_with("L3;"));

    let script = fs::read_to_string(run.join("jobs/job_1.sh")).unwrap();
    assert!(script.starts_with("#!/usr/bin/env bash\nsbatch --wrap=\"singularity exec"));
    assert!(script.contains("--samples_per_complex 3"));
    assert!(script.contains("--ckpt ema_inference_epoch314_model.pt"));
    // Nothing was submitted, so no post-processing script exists either.
    assert!(!run.join("jobs/job_summarize_results.sh").exists());
}

#[test]
fn launch_degrades_to_one_job_per_ligand() {
    let dir = tempdir().unwrap();
    let (protein, ligand_dir, image) = inputs(dir.path(), &["L1.sdf", "L2.sdf"]);
    let out = dir.path().join("small");

    docksweep()
        .arg("launch")
        .args(["--protein-path", protein.to_str().unwrap()])
        .args(["--ligand-dir", ligand_dir.to_str().unwrap()])
        .args(["--out-dir", out.to_str().unwrap()])
        .args(["--jobs", "5"])
        .args(["--image", image.to_str().unwrap()])
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "launching 2 single-ligand job(s) instead",
        ));

    let run = find_run_dir(dir.path(), "small");
    assert!(run.join("csvs/job_csv_2.csv").exists());
    assert!(!run.join("csvs/job_csv_3.csv").exists());
}

#[test]
fn launch_rejects_an_empty_ligand_directory() {
    let dir = tempdir().unwrap();
    let (protein, ligand_dir, image) = inputs(dir.path(), &[]);
    let out = dir.path().join("empty");

    docksweep()
        .arg("launch")
        .args(["--protein-path", protein.to_str().unwrap()])
        .args(["--ligand-dir", ligand_dir.to_str().unwrap()])
        .args(["--out-dir", out.to_str().unwrap()])
        .args(["--jobs", "2"])
        .args(["--image", image.to_str().unwrap()])
        .arg("--dry-run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no ligand files"));
}

#[test]
fn launch_rejects_a_missing_container_image() {
    let dir = tempdir().unwrap();
    let (protein, ligand_dir, _image) = inputs(dir.path(), &["L1.sdf"]);
    let out = dir.path().join("noimage");

    docksweep()
        .arg("launch")
        .args(["--protein-path", protein.to_str().unwrap()])
        .args(["--ligand-dir", ligand_dir.to_str().unwrap()])
        .args(["--out-dir", out.to_str().unwrap()])
        .args(["--jobs", "1", "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("container image"));
}
