#![allow(non_snake_case)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use bashcov_core::{CoverageAggregator, CoverageError, FsSourceTree, TraceSink};
use tempfile::TempDir;

fn record(path: &Path, lineno: u64, command: &str) -> String {
    format!("+BASHCOV> {}/{} BASHCOV: {}\n", path.display(), lineno, command)
}

#[test]
fn aggregate_sink__noise_then_two_records__then_counts_one_slot() {
    let temp = TempDir::new().expect("temp dir");
    let script = temp.path().join("a.sh");
    fs::write(&script, "#!/bin/bash\necho one\necho two\necho three\n").expect("script");

    let mut sink = TraceSink::new().expect("sink");
    sink.write_all(b"program output\n").expect("noise");
    sink.write_all(record(&script, 3, "echo two").as_bytes())
        .expect("record");
    sink.write_all(record(&script, 3, "echo two").as_bytes())
        .expect("record");

    let map = CoverageAggregator::new(FsSourceTree::new(temp.path()))
        .aggregate(sink.rewind().expect("rewind"))
        .expect("aggregate");

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&script), Some(&[0, 0, 2, 0][..]));
}

#[test]
fn aggregate_sink__relative_capture__then_keyed_by_absolute_path() {
    let temp = TempDir::new().expect("temp dir");
    fs::create_dir(temp.path().join("lib")).expect("lib dir");
    let script = temp.path().join("lib").join("helpers.sh");
    fs::write(&script, "f() {\n  :\n}\n").expect("script");

    let mut sink = TraceSink::new().expect("sink");
    sink.write_all(b"+BASHCOV> lib/helpers.sh/2 BASHCOV: :\n")
        .expect("record");

    let map = CoverageAggregator::new(FsSourceTree::new(temp.path()))
        .aggregate(sink.rewind().expect("rewind"))
        .expect("aggregate");

    assert_eq!(map.get(&script), Some(&[0, 1, 0][..]));
}

#[test]
fn aggregate_sink__directory_record__then_skipped_silently() {
    let temp = TempDir::new().expect("temp dir");

    let mut sink = TraceSink::new().expect("sink");
    sink.write_all(format!("+BASHCOV> {}//1 BASHCOV: cd /\n", temp.path().display()).as_bytes())
        .expect("record");

    let map = CoverageAggregator::new(FsSourceTree::new(temp.path()))
        .aggregate(sink.rewind().expect("rewind"))
        .expect("aggregate");

    assert!(map.is_empty());
}

#[test]
fn aggregate_sink__nonexistent_file__then_fatal() {
    let temp = TempDir::new().expect("temp dir");
    let script = temp.path().join("a.sh");
    fs::write(&script, "true\n").expect("script");
    let missing = temp.path().join("deleted.sh");

    let mut sink = TraceSink::new().expect("sink");
    sink.write_all(record(&script, 1, "true").as_bytes())
        .expect("record");
    sink.write_all(record(&missing, 1, "true").as_bytes())
        .expect("record");

    let err = CoverageAggregator::new(FsSourceTree::new(temp.path()))
        .aggregate(sink.rewind().expect("rewind"))
        .unwrap_err();

    match err {
        CoverageError::NotAFile { path } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn aggregate_sink__character_device__then_fatal() {
    let temp = TempDir::new().expect("temp dir");
    let device = Path::new("/dev/null");

    let mut sink = TraceSink::new().expect("sink");
    sink.write_all(record(device, 1, "true").as_bytes())
        .expect("record");

    let err = CoverageAggregator::new(FsSourceTree::new(temp.path()))
        .aggregate(sink.rewind().expect("rewind"))
        .unwrap_err();

    match err {
        CoverageError::NotAFile { path } => assert_eq!(path, device),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn aggregate_sink__real_bash_trace__then_every_line_counted_once() {
    let Ok(bash) = which::which("bash") else {
        eprintln!("bash not found in PATH, skipping");
        return;
    };

    let temp = TempDir::new().expect("temp dir");
    let root = temp.path().canonicalize().expect("canonical root");
    let script = root.join("subject.sh");
    fs::write(&script, "x=1\necho \"$x\"\necho done\n").expect("script");

    // PS4 is not imported from the environment when running as root, so it
    // is set from a startup file instead.
    let startup = root.join("startup.rc");
    fs::write(&startup, "PS4=$BASHCOV_PS4\nset -x\n").expect("startup file");

    let sink = TraceSink::new().expect("sink");
    sink.make_inheritable().expect("inheritable");
    let [(_, ps4), (fd_var, fd)] = sink.environment();

    let status = Command::new(bash)
        .arg(&script)
        .current_dir(&root)
        .env("BASH_ENV", &startup)
        .env("BASHCOV_PS4", ps4)
        .env(fd_var, fd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("run bash");
    assert!(status.success());

    let map = CoverageAggregator::new(FsSourceTree::new(&root))
        .aggregate(sink.rewind().expect("rewind"))
        .expect("aggregate");

    assert_eq!(map.get(&script), Some(&[1, 1, 1][..]));
}
