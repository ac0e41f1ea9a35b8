use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Newline-delimited JSON over any async byte stream pair.
///
/// Used for the daemon's administrative surface (stdin/stdout) as well as for the
/// control connection to service implementations (TCP).
pub struct LineChannel<R, W> {
    reader: R,
    writer: W,
    buffer: String,
}

impl<R, W> LineChannel<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            buffer: String::new(),
        }
    }

    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Reads the next message. `None` once the peer closed the stream.
    /// Blank lines are skipped.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        loop {
            self.buffer.clear();
            let read = self.reader.read_line(&mut self.buffer).await?;
            if read == 0 {
                return Ok(None);
            }
            let line = self.buffer.trim();
            if line.is_empty() {
                continue;
            }
            let message = serde_json::from_str(line)
                .with_context(|| format!("malformed message: {}", line))?;
            return Ok(Some(message));
        }
    }

    /// Sends `request` and waits for one reply.
    pub async fn call<Q: Serialize, A: DeserializeOwned>(&mut self, request: &Q) -> Result<A> {
        self.send(request).await?;
        self.recv()
            .await?
            .context("connection closed before a reply arrived")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{AdminCommand, AdminResponse};
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_round_trip_over_duplex() {
        let (client, server) = tokio::io::duplex(1024);
        let (client_read, client_write) = tokio::io::split(client);
        let (server_read, server_write) = tokio::io::split(server);

        let mut client = LineChannel::new(BufReader::new(client_read), client_write);
        let mut server = LineChannel::new(BufReader::new(server_read), server_write);

        let handle = tokio::spawn(async move {
            let command: AdminCommand = server.recv().await.unwrap().unwrap();
            assert_eq!(command, AdminCommand::ListArtifacts);
            server.send(&AdminResponse::Count(3)).await.unwrap();
        });

        let response: AdminResponse = client.call(&AdminCommand::ListArtifacts).await.unwrap();
        assert_eq!(response, AdminResponse::Count(3));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_end_of_stream() {
        let input: &[u8] = b"\n\"Shutdown\"\n";
        let mut channel = LineChannel::new(BufReader::new(input), tokio::io::sink());
        let first: Option<AdminCommand> = channel.recv().await.unwrap();
        assert_eq!(first, Some(AdminCommand::Shutdown));
        let second: Option<AdminCommand> = channel.recv().await.unwrap();
        assert!(second.is_none());
    }
}
