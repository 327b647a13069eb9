//! Structured rewriting of recorded job commands.
//!
//! A redo run reuses the original run's job script as a template so that
//! every option the operator chose at launch time (resources, model,
//! sample count, seed) carries over without being re-derived. The command
//! line is rewritten token-by-token: only the value following a named
//! option (or the value of a `--key=value` assignment) is replaced, so an
//! option value that happens to contain the substituted path as a
//! substring can never be corrupted.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// A recorded job command, parsed into whitespace-separated tokens.
#[derive(Debug, Clone)]
pub struct JobTemplate {
    tokens: Vec<String>,
}

impl JobTemplate {
    pub fn parse(line: &str) -> Self {
        Self {
            tokens: line.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Loads the command line of a recorded script: the first line is the
    /// interpreter marker, the second the command.
    pub fn from_script(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io("read", path, e))?;
        let line = content
            .lines()
            .nth(1)
            .filter(|line| !line.trim().is_empty())
            .ok_or_else(|| Error::InvalidJobTemplate {
                path: path.to_path_buf(),
            })?;
        Ok(Self::parse(line))
    }

    /// Replaces the token following `option`. Returns false when the
    /// option does not occur (or has no value token).
    pub fn set_option_value(&mut self, option: &str, value: &str) -> bool {
        for i in 0..self.tokens.len().saturating_sub(1) {
            if self.tokens[i] == option {
                self.tokens[i + 1] = value.to_string();
                return true;
            }
        }
        false
    }

    /// Replaces the value of a `--key=value` token identified by its
    /// `--key=` prefix. Returns false when no token carries the prefix.
    pub fn set_assignment(&mut self, prefix: &str, value: &str) -> bool {
        for token in &mut self.tokens {
            if token.starts_with(prefix) {
                *token = format!("{prefix}{value}");
                return true;
            }
        }
        false
    }

    /// Renders the rewritten command. Runs of whitespace in the original
    /// collapse to single spaces; tokens themselves are preserved exactly.
    pub fn render(&self) -> String {
        self.tokens.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "sbatch --wrap=\"singularity exec --bind $PWD image.sif \
python3 -u inference.py --protein_ligand_csv /run/csvs/job_csv_1.csv \
--samples_per_complex 3 --out_dir /run --seed 42\" --mem 4G \
--output=/run/jobs_out/job_1_%j.out --job-name=docksweep -c 4";

    #[test]
    fn replaces_only_the_option_value_token() {
        let mut tpl = JobTemplate::parse(TEMPLATE);
        assert!(tpl.set_option_value("--protein_ligand_csv", "/run/redo/csvs/job_csv_1.csv"));
        let out = tpl.render();
        assert!(out.contains("--protein_ligand_csv /run/redo/csvs/job_csv_1.csv"));
        // Other options survive untouched.
        assert!(out.contains("--samples_per_complex 3"));
        assert!(out.contains("--seed 42"));
    }

    #[test]
    fn value_containing_the_old_path_as_substring_is_not_corrupted() {
        // --out_dir /run is a prefix of the manifest path; naive text
        // substitution on "/run" would mangle it.
        let mut tpl = JobTemplate::parse(TEMPLATE);
        tpl.set_option_value("--protein_ligand_csv", "/elsewhere/job_csv_1.csv");
        assert!(tpl.render().contains("--out_dir /run --seed"));
    }

    #[test]
    fn rewrites_assignment_style_options() {
        let mut tpl = JobTemplate::parse(TEMPLATE);
        assert!(tpl.set_assignment("--output=", "/run/redo/jobs_out/redo_job_1_%j.out"));
        let out = tpl.render();
        assert!(out.contains("--output=/run/redo/jobs_out/redo_job_1_%j.out"));
        assert!(!out.contains("/run/jobs_out/job_1_%j.out"));
    }

    #[test]
    fn missing_option_reports_false() {
        let mut tpl = JobTemplate::parse("echo hello");
        assert!(!tpl.set_option_value("--protein_ligand_csv", "x"));
        assert!(!tpl.set_assignment("--output=", "x"));
        assert_eq!(tpl.render(), "echo hello");
    }

    #[test]
    fn from_script_takes_the_second_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job_1.sh");
        fs::write(&path, "#!/usr/bin/env bash\necho run me\n").unwrap();
        let tpl = JobTemplate::from_script(&path).unwrap();
        assert_eq!(tpl.render(), "echo run me");
    }

    #[test]
    fn script_without_a_command_line_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job_1.sh");
        fs::write(&path, "#!/usr/bin/env bash\n").unwrap();
        assert!(matches!(
            JobTemplate::from_script(&path),
            Err(Error::InvalidJobTemplate { .. })
        ));
    }
}
