//! Coverage aggregation
//!
//! Reads a rewound trace sink once, in stream order, and counts how many
//! times each line of each traced file was executed.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::classifier::LineClassifier;
use crate::error::{CoverageError, CoverageResult};
use crate::sink::RewoundSink;
use crate::workspace::{expand_path, PathKind, SourceTree};

/// Per-file hit counts. Index `i` of a file's counters is line `i + 1`;
/// zero means the line was never observed, not that it is not executable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CoverageMap {
    files: BTreeMap<PathBuf, Vec<u64>>,
}

impl CoverageMap {
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&[u64]> {
        self.files.get(path.as_ref()).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[u64])> {
        self.files
            .iter()
            .map(|(path, hits)| (path.as_path(), hits.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<PathBuf, Vec<u64>> {
        self.files
    }
}

#[derive(Debug, Default)]
struct PassStats {
    lines: u64,
    records: u64,
    directories: u64,
}

/// Single-use aggregator. Both entry points consume it.
pub struct CoverageAggregator<T: SourceTree> {
    tree: T,
    classifier: &'static LineClassifier,
}

impl<T: SourceTree> CoverageAggregator<T> {
    pub fn new(tree: T) -> Self {
        Self {
            tree,
            classifier: LineClassifier::shared(),
        }
    }

    /// Aggregate a sink whose writer has exited. The sink is closed on return,
    /// whether aggregation succeeded or not.
    pub fn aggregate(self, sink: RewoundSink) -> CoverageResult<CoverageMap> {
        let result = self.aggregate_reader(sink.into_reader());
        tracing::debug!("Closed xtrace sink");
        result
    }

    /// Aggregate any line-oriented trace source.
    pub fn aggregate_reader<R: BufRead>(self, mut reader: R) -> CoverageResult<CoverageMap> {
        let mut files = BTreeMap::new();
        let mut stats = PassStats::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            stats.lines += 1;
            self.record_line(&line, &mut files, &mut stats)?;
        }

        tracing::info!(
            lines = stats.lines,
            records = stats.records,
            skipped_directories = stats.directories,
            files = files.len(),
            "Aggregated xtrace output"
        );

        Ok(CoverageMap { files })
    }

    fn record_line(
        &self,
        line: &[u8],
        files: &mut BTreeMap<PathBuf, Vec<u64>>,
        stats: &mut PassStats,
    ) -> CoverageResult<()> {
        let Some(record) = self.classifier.classify(line) else {
            // multi-line command or program output
            tracing::trace!(line = %String::from_utf8_lossy(line).trim_end(), "Skipping noise");
            return Ok(());
        };

        let path = expand_path(record.filename, self.tree.root_directory())
            .map_err(|source| CoverageError::io(record.filename, source))?;
        match self.tree.path_kind(&path) {
            PathKind::Directory => {
                tracing::debug!(path = %path.display(), "Skipping directory record");
                stats.directories += 1;
                return Ok(());
            }
            PathKind::File => {}
            PathKind::Other => return Err(CoverageError::not_a_file(path)),
        }

        // Line 0 is counted in the first slot.
        let index = if record.lineno > 0 {
            record.lineno - 1
        } else {
            record.lineno
        };

        if !files.contains_key(&path) {
            let lines = self
                .tree
                .line_count(&path)
                .map_err(|source| CoverageError::io(&path, source))?;
            tracing::debug!(path = %path.display(), lines, "Tracking new file");
            files.insert(path.clone(), vec![0; lines]);
        }

        let slot = usize::try_from(index)
            .ok()
            .and_then(|index| files.get_mut(&path)?.get_mut(index));
        match slot {
            Some(hits) => *hits += 1,
            None => {
                let lines = files.get(&path).map_or(0, Vec::len);
                return Err(CoverageError::LineOutOfRange {
                    path,
                    line: record.lineno,
                    lines,
                });
            }
        }

        stats.records += 1;
        Ok(())
    }
}
