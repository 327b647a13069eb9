//! Result aggregation: one ranked summary table per run.
//!
//! The worker embeds both quality scores in each result filename
//! (`..._lddt<score>_affinity<score>.sdf`). Scores are kept as the literal
//! embedded strings and the ranking compares them as raw text, which is
//! the compatibility contract of the summary table. Text comparison only
//! orders correctly while all scores share sign and digit-count
//! conventions; the gap is documented in DESIGN.md and deliberately not
//! fixed here.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::scan::Layout;

/// Summary table filename, written at the run-directory root.
pub const SUMMARY_FILE: &str = "summary_results.csv";

/// Fixed summary header.
pub const SUMMARY_HEADER: &str = "Compound_Name;lddt_score;affinity_score;file_path";

/// Scored artifact names: an optional run prefix, the item identifier
/// (with optional `_ligand` and rank decorations), then both scores.
static SCORED_ARTIFACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:VS_DB_)?(?P<id>.+?)(?:_ligand)?(?:_rank\d+)?_lddt(?P<lddt>[^_]+)_affinity(?P<affinity>.+)\.sdf$",
    )
    .unwrap()
});

/// One scored output artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredResult {
    pub name: String,
    /// Structure-quality score, literal text from the filename.
    pub lddt: String,
    /// Predicted affinity, literal text from the filename.
    pub affinity: String,
    pub path: PathBuf,
}

/// Collects every scored artifact in the run, ranked descending by
/// (affinity, lddt) as raw text. Artifacts whose names do not carry both
/// scores are skipped with a warning. Enumeration order is pinned by
/// sorting paths first, so repeated runs over unchanged artifacts produce
/// the identical table.
pub fn collect_results(run_dir: &Path) -> Result<Vec<ScoredResult>> {
    let layout = Layout::detect(run_dir)?;
    let output_dir = layout.output_dir(run_dir);

    let mut paths = Vec::new();
    match layout {
        Layout::Screen => list_sdf_files(&output_dir, &mut paths)?,
        Layout::Complex => {
            let entries = fs::read_dir(&output_dir).map_err(|e| Error::io("read", &output_dir, e))?;
            let mut subdirs: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect();
            subdirs.sort();
            for subdir in subdirs {
                list_sdf_files(&subdir, &mut paths)?;
            }
        }
    }
    paths.sort();

    let mut results: Vec<ScoredResult> = Vec::new();
    for path in paths {
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(caps) = SCORED_ARTIFACT.captures(file_name) else {
            warn!(artifact = file_name, "skipping result file without embedded scores");
            continue;
        };
        results.push(ScoredResult {
            name: caps["id"].to_string(),
            lddt: caps["lddt"].to_string(),
            affinity: caps["affinity"].to_string(),
            path: path.clone(),
        });
    }

    // Stable sort: ties keep path order, so reruns are byte-identical.
    results.sort_by(|a, b| {
        (b.affinity.as_str(), b.lddt.as_str()).cmp(&(a.affinity.as_str(), a.lddt.as_str()))
    });
    Ok(results)
}

fn list_sdf_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io("read", dir, e))?;
    out.extend(
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("sdf")
            }),
    );
    Ok(())
}

/// Writes the ranked summary table to `summary_results.csv` at the run
/// root and returns its path.
pub fn write_summary(run_dir: &Path, results: &[ScoredResult]) -> Result<PathBuf> {
    let dest = run_dir.join(SUMMARY_FILE);

    let mut table = String::from(SUMMARY_HEADER);
    table.push('\n');
    for r in results {
        table.push_str(&format!(
            "{};{};{};{}\n",
            r.name,
            r.lddt,
            r.affinity,
            r.path.display()
        ));
    }

    fs::write(&dest, table).map_err(|e| Error::io("write", &dest, e))?;
    Ok(dest)
}

/// Aggregates a finished run: collect, rank, write. Returns the number of
/// scored artifacts found.
pub fn summarize_run(run_dir: &Path) -> Result<usize> {
    let results = collect_results(run_dir)?;
    write_summary(run_dir, &results)?;
    Ok(results.len())
}
