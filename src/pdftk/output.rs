//! Output stream of a pdftk fill pipeline

use crate::error::{Error, Result};
use futures_util::future::{try_join_all, BoxFuture, FutureExt, TryFutureExt};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tempfile::TempPath;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf,
};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::task::JoinHandle;

/// Largest stderr chunk reported when pdftk fails before producing output
const STDERR_CHUNK: usize = 4096;

/// A spawned pdftk process whose stderr is collected in the background
#[derive(Debug)]
pub(crate) struct Stage {
    name: &'static str,
    child: Child,
    stderr: JoinHandle<std::io::Result<Vec<u8>>>,
}

impl Stage {
    pub(crate) fn new(name: &'static str, mut child: Child) -> Self {
        let stderr = drain(child.stderr.take());
        Self {
            name,
            child,
            stderr,
        }
    }

    async fn finish(mut self) -> Result<()> {
        let status = self.child.wait().await?;
        let stderr = self.stderr.await.map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "{} stderr reader failed: {}",
                self.name, e
            )))
        })??;

        if !stderr.is_empty() {
            return Err(Error::tool(&stderr));
        }
        if !status.success() {
            return Err(Error::Tool {
                message: format!("{} exited with {}", self.name, status),
            });
        }
        Ok(())
    }
}

fn drain(stderr: Option<ChildStderr>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    tokio::spawn(async move {
        let mut collected = Vec::new();
        if let Some(mut stderr) = stderr {
            stderr.read_to_end(&mut collected).await?;
        }
        Ok(collected)
    })
}

/// What a process emitted first
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FirstOutput {
    /// stdout has data; it is still buffered in the reader
    Data,
    /// stderr spoke first
    Stderr(Vec<u8>),
    /// stdout closed without any data
    Eof,
}

/// Wait until `stdout` has data buffered or `stderr` produces bytes.
///
/// The stdout chunk is only peeked, so whoever reads `stdout` afterwards
/// still sees the whole stream.
pub(crate) async fn first_output<R, E>(
    stdout: &mut BufReader<R>,
    stderr: &mut E,
) -> std::io::Result<FirstOutput>
where
    R: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; STDERR_CHUNK];
    let mut stderr_open = true;

    loop {
        tokio::select! {
            buffered = stdout.fill_buf() => {
                let first = if buffered?.is_empty() {
                    FirstOutput::Eof
                } else {
                    FirstOutput::Data
                };
                return Ok(first);
            }
            read = stderr.read(&mut chunk), if stderr_open => {
                match read? {
                    0 => stderr_open = false,
                    n => {
                        chunk.truncate(n);
                        return Ok(FirstOutput::Stderr(chunk));
                    }
                }
            }
        }
    }
}

/// Where the stream is in checking its pdftk stages
enum Completion {
    /// Output still flowing; stages not yet checked
    Streaming(Vec<Stage>),
    /// Output ended; waiting for every stage to exit
    Checking(BoxFuture<'static, Result<()>>),
    /// Every stage exited cleanly
    Done,
    /// A stage failure was already reported by an earlier read
    Failed,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Streaming(stages) => f.debug_tuple("Streaming").field(stages).finish(),
            Completion::Checking(_) => f.write_str("Checking"),
            Completion::Done => f.write_str("Done"),
            Completion::Failed => f.write_str("Failed"),
        }
    }
}

/// Filled PDF bytes streaming out of pdftk
///
/// Owns every process of the pipeline and the XFDF temp file. Dropping it
/// kills processes that are still running and deletes the temp file.
///
/// End of output is only reported once every stage exited successfully with
/// nothing on stderr. Otherwise the read that reaches the end fails with the
/// stage's [`Error::Tool`] wrapped in an `io::Error`.
#[derive(Debug)]
pub struct FilledPdf {
    reader: BufReader<ChildStdout>,
    completion: Completion,
    _xfdf: TempPath,
}

impl FilledPdf {
    /// Hand over the output of `fill` once pdftk has started writing it.
    ///
    /// Fails with the stderr bytes if pdftk reports an error first.
    pub(crate) async fn start(
        mut fill: Child,
        upstream: Vec<Stage>,
        xfdf: TempPath,
    ) -> Result<Self> {
        let stdout = fill.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let mut stderr = fill.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;
        let mut reader = BufReader::new(stdout);

        match first_output(&mut reader, &mut stderr).await? {
            FirstOutput::Data => {}
            FirstOutput::Stderr(message) => return Err(Error::tool(&message)),
            FirstOutput::Eof => {
                let mut message = Vec::new();
                let (status, read) = tokio::join!(fill.wait(), stderr.read_to_end(&mut message));
                let status = status?;
                read?;
                if !message.is_empty() {
                    return Err(Error::tool(&message));
                }
                return Err(Error::Tool {
                    message: format!("pdftk exited with {} without producing output", status),
                });
            }
        }

        let mut stages = upstream;
        stages.push(Stage {
            name: "fill_form",
            child: fill,
            stderr: drain(Some(stderr)),
        });

        Ok(Self {
            reader,
            completion: Completion::Streaming(stages),
            _xfdf: xfdf,
        })
    }

    /// Discard unread output, then check that every stage exited cleanly
    /// without writing to stderr.
    pub async fn finish(mut self) -> Result<()> {
        tokio::io::copy(&mut self, &mut tokio::io::sink())
            .await
            .map_err(from_stream_error)?;
        Ok(())
    }

    /// Read the whole PDF into memory.
    pub async fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.read_to_end(&mut data)
            .await
            .map_err(from_stream_error)?;
        Ok(data)
    }

    /// Stream the whole PDF into `writer`, returning the byte count.
    pub async fn copy_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let written = tokio::io::copy(&mut self, writer)
            .await
            .map_err(from_stream_error)?;
        writer.flush().await?;
        Ok(written)
    }
}

impl AsyncRead for FilledPdf {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();

        loop {
            match &mut this.completion {
                Completion::Streaming(_) => {
                    if buf.remaining() == 0 {
                        return Poll::Ready(Ok(()));
                    }
                    let before = buf.filled().len();
                    ready!(Pin::new(&mut this.reader).poll_read(cx, buf))?;
                    if buf.filled().len() > before {
                        return Poll::Ready(Ok(()));
                    }

                    let stages = match std::mem::replace(&mut this.completion, Completion::Done) {
                        Completion::Streaming(stages) => stages,
                        _ => Vec::new(),
                    };
                    this.completion = Completion::Checking(
                        try_join_all(stages.into_iter().map(Stage::finish))
                            .map_ok(|_| ())
                            .boxed(),
                    );
                }
                Completion::Checking(check) => {
                    let checked = ready!(check.as_mut().poll(cx));
                    return Poll::Ready(match checked {
                        Ok(()) => {
                            this.completion = Completion::Done;
                            Ok(())
                        }
                        Err(e) => {
                            this.completion = Completion::Failed;
                            Err(std::io::Error::other(e))
                        }
                    });
                }
                Completion::Done => return Pin::new(&mut this.reader).poll_read(cx, buf),
                Completion::Failed => {
                    return Poll::Ready(Err(std::io::Error::other(Error::Tool {
                        message: "pdftk pipeline already failed".to_string(),
                    })))
                }
            }
        }
    }
}

/// Recover the crate error a failed stage check carried through `io::Error`.
fn from_stream_error(e: std::io::Error) -> Error {
    if !e.get_ref().is_some_and(|inner| inner.is::<Error>()) {
        return Error::Io(e);
    }
    match e.into_inner().map(|inner| inner.downcast::<Error>()) {
        Some(Ok(stage)) => *stage,
        Some(Err(inner)) => Error::Io(std::io::Error::other(inner)),
        None => Error::Io(std::io::Error::other("pdftk stream failed")),
    }
}

fn missing_pipe(name: &str) -> Error {
    Error::Io(std::io::Error::other(format!("pdftk {} was not piped", name)))
}
