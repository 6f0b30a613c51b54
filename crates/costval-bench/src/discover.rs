//! # Input Discovery
//!
//! Finds the ground-truth files of a batch, samples them, and locates the
//! join-tree files the benchmark reports for each instance.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::error::DriverError;

/// Outputs of other tools that share the directory and the `.csv` extension.
const EXCLUDED_MARKERS: [&str; 3] = ["validate", "bench", "cap-cout"];

/// Ground-truth files in `dir`, sorted by file name.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>, DriverError> {
    let entries = std::fs::read_dir(dir).map_err(|source| DriverError::Discover {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut inputs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_ground_truth(path))
        .collect();
    inputs.sort();
    Ok(inputs)
}

fn is_ground_truth(path: &Path) -> bool {
    let is_csv = path.extension().is_some_and(|ext| ext == "csv");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    is_csv && !EXCLUDED_MARKERS.iter().any(|m| name.contains(*m))
}

/// Pick up to `size` inputs at random, without repetition.
pub fn sample(inputs: &[PathBuf], size: usize, seed: Option<u64>) -> Vec<PathBuf> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    inputs
        .choose_multiple(&mut rng, size.min(inputs.len()))
        .cloned()
        .collect()
}

/// Read the join tree named in a benchmark log line.
///
/// The benchmark may log a path relative to its own working directory, so the
/// file name is first tried in each of `tree_dirs` and only then at the logged
/// path. Relative directories resolve against `workdir`. The first candidate that
/// reads successfully and is non-empty wins.
pub fn locate_tree(logged: &str, workdir: &Path, tree_dirs: &[PathBuf]) -> Option<String> {
    let logged = Path::new(logged);
    let file_name = logged.file_name()?;

    let candidates = tree_dirs
        .iter()
        .map(|dir| workdir.join(dir).join(file_name))
        .chain(std::iter::once(workdir.join(logged)));

    for candidate in candidates {
        match std::fs::read_to_string(&candidate) {
            Ok(content) => {
                let content = content.trim();
                if !content.is_empty() {
                    trace!(path = %candidate.display(), "Found join tree");
                    return Some(content.to_string());
                }
            }
            Err(_) => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "2a.csv", "");
        touch(dir.path(), "1a.csv", "");
        touch(dir.path(), "validate_results.csv", "");
        touch(dir.path(), "bench_out.csv", "");
        touch(dir.path(), "1a-cap-cout.csv", "");
        touch(dir.path(), "notes.txt", "");
        std::fs::create_dir(dir.path().join("dir.csv")).unwrap();

        let inputs = discover_inputs(dir.path()).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["1a.csv", "2a.csv"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_inputs(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, DriverError::Discover { .. }));
    }

    #[test]
    fn test_sample_is_bounded_and_seeded() {
        let inputs: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("{i}.csv"))).collect();

        assert_eq!(sample(&inputs, 100, None).len(), 20);

        let a = sample(&inputs, 5, Some(7));
        let b = sample(&inputs, 5, Some(7));
        assert_eq!(a.len(), 5);
        assert_eq!(a, b);

        let mut unique = a.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_locate_prefers_tree_dirs() {
        let work = tempfile::tempdir().unwrap();
        let trees = work.path().join("trees");
        std::fs::create_dir(&trees).unwrap();
        touch(&trees, "1a_cout.txt", "(A|B)\n");
        touch(work.path(), "1a_cout.txt", "(B|A)");

        let found = locate_tree("/elsewhere/1a_cout.txt", work.path(), &[PathBuf::from("trees")]);
        assert_eq!(found.as_deref(), Some("(A|B)"));
    }

    #[test]
    fn test_locate_falls_back_to_logged_path() {
        let work = tempfile::tempdir().unwrap();
        touch(work.path(), "1a_dpccp.txt", "  ((A|B)|C)  ");

        let found = locate_tree("1a_dpccp.txt", work.path(), &[PathBuf::from("missing")]);
        assert_eq!(found.as_deref(), Some("((A|B)|C)"));
    }

    #[test]
    fn test_locate_skips_empty_files() {
        let work = tempfile::tempdir().unwrap();
        let trees = work.path().join("trees");
        std::fs::create_dir(&trees).unwrap();
        touch(&trees, "t.txt", "   \n");
        touch(work.path(), "t.txt", "(A|B)");

        let found = locate_tree("t.txt", work.path(), &[PathBuf::from("trees")]);
        assert_eq!(found.as_deref(), Some("(A|B)"));
        assert_eq!(locate_tree("absent.txt", work.path(), &[]), None);
    }
}
