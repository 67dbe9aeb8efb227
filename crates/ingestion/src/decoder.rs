//! Decoder - source file to lazy line sequence
//!
//! Plain and gzip input are decoded on the calling thread. Tar-gzip input is
//! walked by a dedicated reader thread because archive entries borrow the
//! archive; lines are handed over through a bounded channel so memory stays
//! bounded.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;

use async_channel::{Receiver, Sender};
use contracts::CompressionKind;
use flate2::read::GzDecoder;
use tracing::{debug, instrument};

use crate::error::{IngestionError, Result};

/// Lines buffered between the tar reader thread and the consumer
const TAR_CHANNEL_CAPACITY: usize = 1024;

/// Lazy, single-pass sequence of decoded lines
///
/// Each line is stripped of surrounding whitespace. After the first decode
/// error the sequence ends.
pub struct Lines {
    kind: CompressionKind,
    inner: Box<dyn Iterator<Item = Result<String>> + Send>,
}

impl Lines {
    /// Compression kind used to decode the file
    pub fn kind(&self) -> CompressionKind {
        self.kind
    }
}

impl Iterator for Lines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Resolve the compression kind: explicit override first, then file suffix
pub fn resolve_kind(path: &Path, kind: Option<CompressionKind>) -> Result<CompressionKind> {
    kind.or_else(|| CompressionKind::from_path(path))
        .ok_or_else(|| IngestionError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
}

/// Open a source file as a lazy line sequence
///
/// # Errors
/// - `UnsupportedFormat` when no kind is given and the suffix is unknown
/// - `Open` when the file cannot be opened
#[instrument(name = "decoder_open", fields(path = %path.display()))]
pub fn open(path: &Path, kind: Option<CompressionKind>) -> Result<Lines> {
    let kind = resolve_kind(path, kind)?;
    let file = File::open(path).map_err(|source| IngestionError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(%kind, "decoding source file");

    let inner: Box<dyn Iterator<Item = Result<String>> + Send> = match kind {
        CompressionKind::Plain => Box::new(LineDecoder::new(BufReader::new(file), path)),
        CompressionKind::Gzip => Box::new(LineDecoder::new(
            BufReader::new(GzDecoder::new(file)),
            path,
        )),
        CompressionKind::TarGzip => Box::new(TarLines::spawn(path.to_path_buf(), file)?),
    };

    Ok(Lines { kind, inner })
}

/// Count the lines of a source file with a full decoding pass
///
/// # Errors
/// Any error [`open`] or decoding produces.
pub fn count_lines(path: &Path, kind: Option<CompressionKind>) -> Result<u64> {
    count_lines_until(path, kind, || false).map(Option::unwrap_or_default)
}

/// Count lines, checking `stop` before each line
///
/// Returns `None` when `stop` fired before the pass finished.
#[instrument(name = "decoder_count_lines", skip(stop), fields(path = %path.display()))]
pub fn count_lines_until(
    path: &Path,
    kind: Option<CompressionKind>,
    stop: impl Fn() -> bool,
) -> Result<Option<u64>> {
    let mut count = 0u64;
    for line in open(path, kind)? {
        if stop() {
            debug!(count, "line count stopped");
            return Ok(None);
        }
        line?;
        count += 1;
    }
    debug!(count, "line count complete");
    Ok(Some(count))
}

/// Splits a byte stream into UTF-8 lines
struct LineDecoder<R> {
    reader: R,
    path: PathBuf,
    context: Option<String>,
    line_no: u64,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> LineDecoder<R> {
    fn new(reader: R, path: &Path) -> Self {
        Self {
            reader,
            path: path.to_path_buf(),
            context: None,
            line_no: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Tag decode errors with the archive entry name
    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn error(&self, message: impl std::fmt::Display) -> IngestionError {
        let message = match &self.context {
            Some(entry) => format!("entry '{entry}': {message}"),
            None => message.to_string(),
        };
        IngestionError::decode(&self.path, self.line_no, message)
    }
}

impl<R: BufRead> Iterator for LineDecoder<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line_no += 1;
                match std::str::from_utf8(&self.buf) {
                    Ok(text) => Some(Ok(text.trim().to_string())),
                    Err(e) => {
                        self.done = true;
                        Some(Err(self.error(format!("invalid utf-8: {e}"))))
                    }
                }
            }
            Err(e) => {
                self.done = true;
                self.line_no += 1;
                Some(Err(self.error(e)))
            }
        }
    }
}

/// Lines of every regular (or hard-linked) file in a tar-gzip archive, in
/// archive order
struct TarLines {
    rx: Receiver<Result<String>>,
}

impl TarLines {
    fn spawn(path: PathBuf, file: File) -> Result<Self> {
        let (tx, rx) = async_channel::bounded(TAR_CHANNEL_CAPACITY);
        let thread_path = path.clone();

        thread::Builder::new()
            .name("flp-tar-reader".to_string())
            .spawn(move || {
                if let Err(e) = read_archive(&thread_path, file, &tx) {
                    let _ = tx.send_blocking(Err(e));
                }
            })
            .map_err(|source| IngestionError::Open { path, source })?;

        Ok(Self { rx })
    }
}

impl Iterator for TarLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        // Sender dropped means the reader thread finished
        self.rx.recv_blocking().ok()
    }
}

/// Send lines of each regular or hard-linked entry; stops quietly when the
/// consumer is gone
fn read_archive(path: &Path, file: File, tx: &Sender<Result<String>>) -> Result<()> {
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let entries = archive
        .entries()
        .map_err(|e| IngestionError::decode(path, 0, format!("invalid archive: {e}")))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| IngestionError::decode(path, 0, format!("invalid entry: {e}")))?;

        let entry_type = entry.header().entry_type();
        if entry_type.is_hard_link() {
            let entry_name = entry_path(&entry);
            let Some(target) = entry.link_name().ok().flatten() else {
                continue;
            };
            debug!(
                entry = %entry_name,
                target = %target.display(),
                "re-reading hard-linked entry"
            );
            let target = target.into_owned();
            if !send_linked(path, &target, tx)? {
                return Ok(());
            }
            continue;
        }
        if !entry_type.is_file() {
            continue;
        }

        let entry_name = entry_path(&entry);
        debug!(entry = %entry_name, "reading archive entry");

        let lines = LineDecoder::new(BufReader::new(entry), path).with_context(entry_name);
        for line in lines {
            let failed = line.is_err();
            if tx.send_blocking(line).is_err() || failed {
                return Ok(());
            }
        }
    }

    Ok(())
}

fn entry_path<R: std::io::Read>(entry: &tar::Entry<'_, R>) -> String {
    entry
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "<unnamed>".to_string())
}

/// Send the lines of the regular entry a hard link points to
///
/// The archive is a forward-only stream, so the target is found by reopening
/// it. Symbolic links are not followed. Returns `false` once sending should
/// stop.
fn send_linked(path: &Path, target: &Path, tx: &Sender<Result<String>>) -> Result<bool> {
    let file = File::open(path).map_err(|source| IngestionError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let entries = archive
        .entries()
        .map_err(|e| IngestionError::decode(path, 0, format!("invalid archive: {e}")))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| IngestionError::decode(path, 0, format!("invalid entry: {e}")))?;
        let is_target = entry.header().entry_type().is_file()
            && entry.path().is_ok_and(|p| &*p == target);
        if !is_target {
            continue;
        }

        let lines = LineDecoder::new(BufReader::new(entry), path)
            .with_context(target.display().to_string());
        for line in lines {
            let failed = line.is_err();
            if tx.send_blocking(line).is_err() || failed {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    Err(IngestionError::decode(
        path,
        0,
        format!("hard link target '{}' not found", target.display()),
    ))
}
