//! Bashcov Core Library
//!
//! Turns bash `xtrace` output into per-line execution counts.
//!
//! The traced shell is launched by the caller with [`format::ps4`] as its
//! `PS4` and a [`sink::TraceSink`] descriptor as its `BASH_XTRACEFD`. Once the
//! shell has exited, the sink is rewound and handed to a
//! [`aggregator::CoverageAggregator`], which returns a [`CoverageMap`].
//!
//! ```no_run
//! use bashcov_core::{CoverageAggregator, FsSourceTree, TraceSink};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = TraceSink::new()?;
//! sink.make_inheritable()?;
//! // ... launch bash with `sink.environment()` and wait for it ...
//! let coverage = CoverageAggregator::new(FsSourceTree::new("/project"))
//!     .aggregate(sink.rewind()?)?;
//! for (path, hits) in coverage.iter() {
//!     println!("{}: {:?}", path.display(), hits);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod classifier;
pub mod error;
pub mod format;
pub mod sink;
pub mod workspace;

pub use aggregator::{CoverageAggregator, CoverageMap};
pub use classifier::{LineClassifier, TraceRecord};
pub use error::{CoverageError, CoverageResult};
pub use format::{ps4, Sentinel, SENTINEL};
pub use sink::{RewoundSink, TraceSink};
pub use workspace::{expand_path, FsSourceTree, PathKind, SourceTree};
