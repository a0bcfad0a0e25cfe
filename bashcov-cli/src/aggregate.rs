//! `bashcov aggregate` command.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bashcov_core::{CoverageAggregator, CoverageMap, FsSourceTree, RewoundSink, SourceTree};
use clap::ValueEnum;

/// How the aggregated coverage is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One summary line per file
    Text,
    /// The full coverage map as a JSON object
    Json,
}

pub fn run(trace: &Path, root: Option<PathBuf>, format: OutputFormat) -> anyhow::Result<()> {
    let tree = match root {
        Some(root) => FsSourceTree::new(
            root.canonicalize()
                .with_context(|| format!("Failed to resolve root {}", root.display()))?,
        ),
        None => FsSourceTree::current_dir().context("Failed to read current directory")?,
    };
    tracing::debug!(
        trace = %trace.display(),
        root = %tree.root_directory().display(),
        "Aggregating captured trace"
    );

    let coverage = aggregate_file(trace, tree)?;
    println!("{}", render(&coverage, format)?);
    Ok(())
}

fn aggregate_file(trace: &Path, tree: FsSourceTree) -> anyhow::Result<CoverageMap> {
    let file = File::open(trace)
        .with_context(|| format!("Failed to open trace file {}", trace.display()))?;

    CoverageAggregator::new(tree)
        .aggregate(RewoundSink::from_file(file))
        .with_context(|| format!("Failed to aggregate {}", trace.display()))
}

fn render(coverage: &CoverageMap, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(coverage)?),
        OutputFormat::Text => Ok(summary(coverage)),
    }
}

fn summary(coverage: &CoverageMap) -> String {
    if coverage.is_empty() {
        return "No traced files".to_string();
    }

    coverage
        .iter()
        .map(|(path, hits)| {
            let executed = hits.iter().filter(|&&count| count > 0).count();
            format!("{}: {}/{} lines executed", path.display(), executed, hits.len())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let script = temp.path().join("a.sh");
        fs::write(&script, "echo one\necho two\n").expect("script");
        let trace = temp.path().join("xtrace.log");
        fs::write(
            &trace,
            format!("hello\n+BASHCOV> {}/2 BASHCOV: echo two\n", script.display()),
        )
        .expect("trace");
        (temp, script, trace)
    }

    #[test]
    fn aggregate_file__captured_trace__then_counts() {
        let (temp, script, trace) = fixture();
        let coverage = aggregate_file(&trace, FsSourceTree::new(temp.path())).unwrap();
        assert_eq!(coverage.get(&script), Some(&[0, 1][..]));
    }

    #[test]
    fn aggregate_file__missing_trace__then_error_names_file() {
        let temp = TempDir::new().expect("temp dir");
        let missing = temp.path().join("none.log");
        let err = aggregate_file(&missing, FsSourceTree::new(temp.path())).unwrap_err();
        assert!(format!("{err}").contains("none.log"));
    }

    #[test]
    fn render__text__then_one_summary_line_per_file() {
        let (temp, script, trace) = fixture();
        let coverage = aggregate_file(&trace, FsSourceTree::new(temp.path())).unwrap();

        let text = render(&coverage, OutputFormat::Text).unwrap();
        assert_eq!(text, format!("{}: 1/2 lines executed", script.display()));
    }

    #[test]
    fn render__json__then_parses_back() {
        let (temp, script, trace) = fixture();
        let coverage = aggregate_file(&trace, FsSourceTree::new(temp.path())).unwrap();

        let json = render(&coverage, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[script.to_str().unwrap()], serde_json::json!([0, 1]));
    }

    #[test]
    fn output_format__from_str__then_accepts_known_names_only() {
        assert_eq!(OutputFormat::from_str("json", true).unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("TEXT", true).unwrap(), OutputFormat::Text);
        assert!(OutputFormat::from_str("html", true).is_err());
    }

    #[test]
    fn summary__empty__then_placeholder() {
        assert_eq!(summary(&CoverageMap::default()), "No traced files");
    }
}
