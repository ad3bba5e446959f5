//! Beacon wire format
//!
//! One bincode-encoded `Beacon` per connection, no further framing. The
//! sender writes the record and closes.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, AppResult};
use crate::models::Beacon;

pub fn encode(beacon: &Beacon) -> AppResult<Vec<u8>> {
    bincode::serialize(beacon).map_err(AppError::Encode)
}

pub fn decode(bytes: &[u8]) -> AppResult<Beacon> {
    bincode::deserialize(bytes).map_err(AppError::Decode)
}

/// Read one beacon from `reader`, rejecting payloads larger than `limit` bytes.
///
/// Returns as soon as a complete record has arrived, or decodes whatever was
/// received once the peer closes.
pub async fn read_beacon<R>(mut reader: R, limit: usize) -> AppResult<Beacon>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(limit.min(1024));
    let mut chunk = [0u8; 512];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return decode(&buf);
        }
        buf.extend_from_slice(&chunk[..n]);

        // A complete record wins over whatever trails it in the same read
        match bincode::deserialize::<Beacon>(&buf) {
            Ok(beacon) => {
                let size = bincode::serialized_size(&beacon).map_err(AppError::Decode)?;
                if size > limit as u64 {
                    return Err(AppError::PayloadTooLarge { limit });
                }
                return Ok(beacon);
            }
            Err(e) if is_incomplete(&e) => {
                if buf.len() > limit {
                    return Err(AppError::PayloadTooLarge { limit });
                }
            }
            Err(e) => return Err(AppError::Decode(e)),
        }
    }
}

fn is_incomplete(err: &bincode::Error) -> bool {
    matches!(err.as_ref(), bincode::ErrorKind::Io(io) if io.kind() == ErrorKind::UnexpectedEof)
}

/// Write one beacon and close the write half.
pub async fn write_beacon<W>(writer: &mut W, beacon: &Beacon) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = encode(beacon)?;
    writer.write_all(&bytes).await?;
    writer.shutdown().await?;
    Ok(())
}
