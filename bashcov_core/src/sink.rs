//! Trace sink
//!
//! Single-use channel the traced shell writes its `xtrace` output into.
//! The states are encoded as types:
//!
//! - [`TraceSink`]: open for writing, its descriptor handed to the child
//! - [`RewoundSink`]: positioned at the start, ready to be read once
//!
//! Reading a [`RewoundSink`] consumes it, closing the underlying file. There
//! is no way back to the writable state.
//!
//! The caller must wait for the traced process to exit before calling
//! [`TraceSink::rewind`]; nothing here enforces it.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::os::unix::io::{AsRawFd, RawFd};

use crate::format;

/// Variable bash reads the xtrace destination descriptor from.
pub const XTRACE_FD_VAR: &str = "BASH_XTRACEFD";
/// Variable holding the trace prompt.
pub const PS4_VAR: &str = "PS4";

#[derive(Debug)]
pub struct TraceSink {
    file: File,
}

impl TraceSink {
    /// Create a sink backed by an anonymous temporary file.
    pub fn new() -> io::Result<Self> {
        let file = tempfile::tempfile()?;
        tracing::debug!(fd = file.as_raw_fd(), "Created xtrace sink");
        Ok(Self { file })
    }

    /// Raw descriptor to use as the traced shell's `BASH_XTRACEFD`.
    pub fn descriptor(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// Clear `FD_CLOEXEC` so the descriptor survives into a spawned child.
    pub fn make_inheritable(&self) -> io::Result<()> {
        let fd = self.descriptor();
        // SAFETY: fd is owned by self.file and stays open for the call.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        let result = unsafe { libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC) };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Environment the traced shell needs: the trace prompt and the
    /// descriptor to write records to.
    pub fn environment(&self) -> [(&'static str, String); 2] {
        [
            (PS4_VAR, format::ps4()),
            (XTRACE_FD_VAR, self.descriptor().to_string()),
        ]
    }

    /// Move to the read state. Only valid once the writer has exited.
    pub fn rewind(mut self) -> io::Result<RewoundSink> {
        self.file.flush()?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(RewoundSink { file: self.file })
    }
}

impl AsRawFd for TraceSink {
    fn as_raw_fd(&self) -> RawFd {
        self.descriptor()
    }
}

impl Write for TraceSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[derive(Debug)]
pub struct RewoundSink {
    file: File,
}

impl RewoundSink {
    /// Wrap a file that already holds a complete trace, e.g. one captured by
    /// an earlier run. Reading starts at the file's current position.
    pub fn from_file(file: File) -> Self {
        Self { file }
    }

    /// Buffered reader over the remaining content. Dropping it closes the sink.
    pub fn into_reader(self) -> BufReader<File> {
        BufReader::new(self.file)
    }

    /// Read everything and close the sink.
    pub fn read_to_end(mut self) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        self.file.read_to_end(&mut content)?;
        Ok(content)
    }
}
