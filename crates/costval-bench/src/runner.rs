//! # Benchmark Invocation
//!
//! Runs the external optimizer benchmark on one ground-truth file and collects the
//! join trees it wrote. The benchmark announces each tree file on stdout:
//!
//! ```text
//! [dpconv] Debug filename: ../job_join_trees/1a_cout.txt
//! [dpccp]  Debug filename: ../job_join_trees/1a_dpccp.txt
//! ```
//!
//! The file name tells the plans apart: `cout` marks the approximate (DPconv)
//! plan, `dpccp` the exact plan, and `cmax` is accepted as the exact plan when no
//! `dpccp` tree has been seen.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::discover::locate_tree;
use crate::error::DriverError;

const TREE_MARKER: &str = "Debug filename:";

/// Run `bench <csv>` in `workdir` and return its stdout.
pub async fn run_bench(
    bench: &Path,
    csv: &Path,
    workdir: &Path,
    timeout: Duration,
) -> Result<String, DriverError> {
    let mut command = Command::new(bench);
    command
        .arg(csv)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| DriverError::Timeout {
            secs: timeout.as_secs(),
        })?
        .map_err(DriverError::Spawn)?;

    if !output.status.success() {
        debug!(status = %output.status, csv = %csv.display(), "Benchmark exited unsuccessfully");
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Paths announced by the benchmark, in output order.
pub fn tree_paths(stdout: &str) -> Vec<&str> {
    stdout
        .lines()
        .filter_map(|line| line.split_once(TREE_MARKER))
        .map(|(_, path)| path.trim())
        .filter(|path| !path.is_empty())
        .collect()
}

/// Which plan a tree file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Approx,
    Exact,
    /// Cost-max tree; stands in for the exact plan.
    CostMax,
}

impl PlanKind {
    pub fn classify(path: &str) -> Option<Self> {
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.contains("cout") {
            Some(PlanKind::Approx)
        } else if name.contains("dpccp") {
            Some(PlanKind::Exact)
        } else if name.contains("cmax") {
            Some(PlanKind::CostMax)
        } else {
            None
        }
    }
}

/// The two trees of one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanTrees {
    pub approx: Option<String>,
    pub exact: Option<String>,
}

impl PlanTrees {
    pub fn offer(&mut self, kind: PlanKind, tree: String) {
        match kind {
            PlanKind::Approx => self.approx = Some(tree),
            PlanKind::Exact => self.exact = Some(tree),
            PlanKind::CostMax => {
                if self.exact.is_none() {
                    self.exact = Some(tree);
                }
            }
        }
    }

    /// Both trees, if both were found.
    pub fn complete(self) -> Option<(String, String)> {
        self.approx.zip(self.exact)
    }

    /// Collect the trees announced in a benchmark's stdout.
    pub fn from_output(stdout: &str, workdir: &Path, tree_dirs: &[PathBuf]) -> Self {
        let mut trees = Self::default();
        for logged in tree_paths(stdout) {
            let Some(kind) = PlanKind::classify(logged) else {
                continue;
            };
            if let Some(tree) = locate_tree(logged, workdir, tree_dirs) {
                trees.offer(kind, tree);
            } else {
                debug!(path = logged, "Announced join tree not found");
            }
        }
        trees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
loading 1a.csv
[dpconv] Debug filename: ../job_join_trees/1a_cout.txt
[dpccp] Debug filename:   ../job_join_trees/1a_dpccp.txt
Debug filename:
done
";

    #[test]
    fn test_tree_paths() {
        assert_eq!(
            tree_paths(OUTPUT),
            vec!["../job_join_trees/1a_cout.txt", "../job_join_trees/1a_dpccp.txt"]
        );
        assert!(tree_paths("nothing here").is_empty());
    }

    #[test]
    fn test_classify() {
        assert_eq!(PlanKind::classify("x/1a_cout.txt"), Some(PlanKind::Approx));
        assert_eq!(PlanKind::classify("1a_dpccp.txt"), Some(PlanKind::Exact));
        assert_eq!(PlanKind::classify("1a_cmax.txt"), Some(PlanKind::CostMax));
        assert_eq!(PlanKind::classify("1a_other.txt"), None);
        // Directory names do not classify a file.
        assert_eq!(PlanKind::classify("cout_trees/1a.txt"), None);
    }

    #[test]
    fn test_cost_max_only_fills_missing_exact() {
        let mut trees = PlanTrees::default();
        trees.offer(PlanKind::CostMax, "(A|B)".into());
        assert_eq!(trees.exact.as_deref(), Some("(A|B)"));

        trees.offer(PlanKind::CostMax, "(B|A)".into());
        assert_eq!(trees.exact.as_deref(), Some("(A|B)"));

        trees.offer(PlanKind::Exact, "((A|B)|C)".into());
        assert_eq!(trees.exact.as_deref(), Some("((A|B)|C)"));
        assert!(trees.clone().complete().is_none());

        trees.offer(PlanKind::Approx, "(A|(B|C))".into());
        assert_eq!(
            trees.complete(),
            Some(("(A|(B|C))".to_string(), "((A|B)|C)".to_string()))
        );
    }

    #[test]
    fn test_from_output_reads_located_files() {
        let work = tempfile::tempdir().unwrap();
        let trees_dir = work.path().join("job_join_trees");
        std::fs::create_dir(&trees_dir).unwrap();
        std::fs::write(trees_dir.join("1a_cout.txt"), "(A|B)").unwrap();

        let trees = PlanTrees::from_output(OUTPUT, work.path(), &[PathBuf::from("job_join_trees")]);
        assert_eq!(trees.approx.as_deref(), Some("(A|B)"));
        assert_eq!(trees.exact, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_bench_captures_stdout() {
        let work = tempfile::tempdir().unwrap();
        let stdout = run_bench(
            Path::new("/bin/echo"),
            Path::new("Debug filename: t_cout.txt"),
            work.path(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(tree_paths(&stdout), vec!["t_cout.txt"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_bench_missing_binary() {
        let work = tempfile::tempdir().unwrap();
        let err = run_bench(
            &work.path().join("no-such-bench"),
            Path::new("1a.csv"),
            work.path(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DriverError::Spawn(_)));
    }
}
