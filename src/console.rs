//! Operator console
//!
//! Reads commands line by line (normally from stdin) and prints the
//! responses. Only the console may stop the server with `exit`/`quit`.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::coordinator::{CoordinatorHandle, Origin};
use crate::error::Result;

const PROMPT: &[u8] = b"$ ";

/// Why the console stopped reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// The operator asked to shut down
    Shutdown,
    /// Input was closed
    EndOfInput,
}

/// Run the console over stdin and stdout
pub async fn run_stdio(coordinator: CoordinatorHandle) -> Result<ConsoleExit> {
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    run(coordinator, input, tokio::io::stdout()).await
}

/// Run the console until `exit` or end of input
pub async fn run<R, W>(coordinator: CoordinatorHandle, input: R, mut output: W) -> Result<ConsoleExit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            tracing::debug!("Console input closed");
            return Ok(ConsoleExit::EndOfInput);
        };

        let response = coordinator.command(line, Origin::Console).await?;
        if let Some(text) = response.text {
            output.write_all(text.as_bytes()).await?;
            output.write_all(b"\n").await?;
        }
        if response.shutdown {
            output.flush().await?;
            return Ok(ConsoleExit::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::assert_ok;

    use super::*;
    use crate::coordinator::Coordinator;
    use crate::dispatch::ViewerHub;
    use crate::sync::SyncConfig;

    fn start() -> CoordinatorHandle {
        let (coordinator, handle) = Coordinator::new(
            ViewerHub::new(Duration::from_millis(10)),
            SyncConfig::default(),
            16,
        );
        tokio::spawn(coordinator.run());
        handle
    }

    #[tokio::test]
    async fn test_exit_stops_reading() {
        let handle = start();
        let mut output = Vec::new();

        let exit = assert_ok!(run(handle, &b"pause 10\n\nexit\nplay\n"[..], &mut output).await);
        assert_eq!(exit, ConsoleExit::Shutdown);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "$ Pausing at 10\n$ $ Stopping server\n"
        );
    }

    #[tokio::test]
    async fn test_end_of_input() {
        let handle = start();
        let mut output = Vec::new();

        let exit = assert_ok!(run(handle.clone(), &b"bogus"[..], &mut output).await);
        assert_eq!(exit, ConsoleExit::EndOfInput);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "$ No such command as \"bogus\" exists.\n$ "
        );
    }
}
