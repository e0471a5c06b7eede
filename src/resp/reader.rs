use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use super::RespValue;

/// Largest bulk payload accepted from the wire (Redis' default proto-max-bulk-len).
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

type ReadFuture<'a> = Pin<Box<dyn Future<Output = io::Result<Option<RespValue>>> + Send + 'a>>;

pub struct RespReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin + Send> RespReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read one reply of any type. `Ok(None)` means a clean EOF before the
    /// first byte of a reply.
    pub async fn read_reply(&mut self) -> io::Result<Option<RespValue>> {
        self.read_value().await
    }

    /// Read a Redis command (array of bulk strings)
    pub async fn read_command(&mut self) -> io::Result<Option<Vec<Vec<u8>>>> {
        let line = match self.read_line().await? {
            Some(line) => line,
            None => return Ok(None), // EOF
        };

        if line.first() != Some(&b'*') {
            return Err(invalid_data("expected array"));
        }

        let count = parse_int(&line[1..])?;
        if count < 0 {
            return Err(invalid_data("invalid array length"));
        }

        let mut args = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            match self.read_value().await? {
                Some(RespValue::BulkString(Some(arg))) => args.push(arg),
                Some(_) => return Err(invalid_data("expected bulk string")),
                None => return Err(unexpected_eof()),
            }
        }

        Ok(Some(args))
    }

    fn read_value(&mut self) -> ReadFuture<'_> {
        Box::pin(async move {
            let line = match self.read_line().await? {
                Some(line) => line,
                None => return Ok(None),
            };

            let (tag, rest) = match line.split_first() {
                Some((tag, rest)) => (*tag, rest),
                None => return Err(invalid_data("empty reply line")),
            };

            let value = match tag {
                b'+' => RespValue::SimpleString(String::from_utf8_lossy(rest).into_owned()),
                b'-' => RespValue::Error(String::from_utf8_lossy(rest).into_owned()),
                b':' => RespValue::Integer(parse_int(rest)?),
                b'$' => {
                    let len = parse_int(rest)?;
                    if len < 0 {
                        RespValue::BulkString(None)
                    } else if len > MAX_BULK_LEN {
                        return Err(invalid_data("bulk string too large"));
                    } else {
                        let len = len as usize;
                        let mut data = vec![0u8; len + 2]; // +2 for \r\n
                        self.reader.read_exact(&mut data).await?;
                        if &data[len..] != b"\r\n" {
                            return Err(invalid_data("bulk string not terminated by CRLF"));
                        }
                        data.truncate(len);
                        RespValue::BulkString(Some(data))
                    }
                }
                b'*' => {
                    let len = parse_int(rest)?;
                    if len < 0 {
                        RespValue::Array(None)
                    } else {
                        let mut items = Vec::with_capacity(len.min(1024) as usize);
                        for _ in 0..len {
                            match self.read_value().await? {
                                Some(item) => items.push(item),
                                None => return Err(unexpected_eof()),
                            }
                        }
                        RespValue::Array(Some(items))
                    }
                }
                other => {
                    return Err(invalid_data(&format!(
                        "unknown reply type byte 0x{:02x}",
                        other
                    )))
                }
            };

            Ok(Some(value))
        })
    }

    /// Read a CRLF-terminated line without its terminator.
    async fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let n = self.reader.read_until(b'\n', &mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        if !line.ends_with(b"\r\n") {
            return Err(unexpected_eof());
        }
        line.truncate(line.len() - 2);
        Ok(Some(line))
    }
}

fn parse_int(bytes: &[u8]) -> io::Result<i64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| invalid_data("invalid integer"))
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

fn unexpected_eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed mid-reply")
}
