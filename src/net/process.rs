//! netsh invocation: checked, silent, and bounded-capture variants.
//!
//! An `Err` from any runner method means netsh could not be launched at
//! all; a process that started but failed reports through its exit code.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Per-stream capture limit. Output beyond this is dropped, not grown into.
pub const CAPTURE_BUFFER_SIZE: usize = 8192;

/// How long a captured command may take to exit after its output is read.
const EXIT_WAIT: Duration = Duration::from_secs(5);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Output of a captured run. `exit_code` is `None` when the child had not
/// exited by the end of the wait window; `text` holds whatever was read.
#[derive(Clone, Default, Debug)]
pub struct Capture {
    pub exit_code: Option<i32>,
    pub text: String,
}

#[allow(async_fn_in_trait)]
pub trait NetshRunner {
    /// Checked run: netsh writes to the console, the exit code is returned.
    /// Waits for completion without a time limit.
    async fn run(&self, args: &str) -> std::io::Result<i32>;

    /// Fire-and-forget: stdio nulled, outcome discarded entirely.
    async fn run_silent(&self, args: &str);

    /// Captured run with bounded buffers and a bounded exit wait.
    async fn run_captured(&self, args: &str) -> std::io::Result<Capture>;
}

/// The production runner: spawns `netsh.exe` with the argument string
/// passed through verbatim.
pub struct Netsh;

impl Netsh {
    fn command(args: &str) -> Command {
        let mut command = Command::new("netsh.exe");

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt as _;
            command.as_std_mut().raw_arg(args);
            command.creation_flags(CREATE_NO_WINDOW);
        }

        // netsh only exists on Windows; the token split keeps the runner
        // compiling (and failing to launch cleanly) elsewhere.
        #[cfg(not(windows))]
        command.args(args.split_whitespace());

        command
    }
}

impl NetshRunner for Netsh {
    async fn run(&self, args: &str) -> std::io::Result<i32> {
        debug!(%args, "netsh");
        let status = Self::command(args).status().await?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn run_silent(&self, args: &str) {
        debug!(%args, "netsh (silent)");
        let mut command = Self::command(args);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Ok(mut child) = command.spawn() {
            let _ = child.wait().await;
        }
    }

    async fn run_captured(&self, args: &str) -> std::io::Result<Capture> {
        debug!(%args, "netsh (captured)");
        let mut command = Self::command(args);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (mut text, err) = tokio::join!(
            read_bounded(stdout, CAPTURE_BUFFER_SIZE),
            read_bounded(stderr, CAPTURE_BUFFER_SIZE),
        );
        text.push_str(&err);

        let exit_code = match timeout(EXIT_WAIT, child.wait()).await {
            Ok(Ok(status)) => status.code(),
            Ok(Err(_)) => None,
            Err(_) => {
                warn!(%args, "netsh still running after wait window, using partial output");
                None
            }
        };

        Ok(Capture { exit_code, text })
    }
}

/// Read a stream until EOF or until `limit` bytes are buffered; anything
/// past the limit is lost.
async fn read_bounded<R: AsyncRead + Unpin>(stream: Option<R>, limit: usize) -> String {
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut buf = vec![0u8; limit];
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]).await {
            Ok(0) | Err(_) => break,
            Ok(n) => filled += n,
        }
    }
    buf.truncate(filled);
    String::from_utf8_lossy(&buf).into_owned()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_bounded_truncates() {
        let data = [b'x'; 100];
        let text = read_bounded(Some(&data[..]), 16).await;
        assert_eq!(text.len(), 16);
    }

    #[tokio::test]
    async fn test_read_bounded_reads_to_eof() {
        let text = read_bounded(Some(&b"hello"[..]), CAPTURE_BUFFER_SIZE).await;
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_read_bounded_missing_stream() {
        let text = read_bounded(None::<&[u8]>, 16).await;
        assert!(text.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_netsh_capture() {
        // Requires a real netsh.exe.
        let capture = Netsh
            .run_captured("interface ipv4 show dnsservers")
            .await
            .expect("netsh should launch");
        assert!(!capture.text.is_empty());
    }
}
