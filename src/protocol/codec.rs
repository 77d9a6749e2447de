//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │   Fields                    │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! Fields are `u32 BE length + bytes`. The first two fields of every
//! command are the username and password; the remaining fields depend on
//! the command type.
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use crate::error::{Result, VaultError};

use super::{Command, Credentials, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + length-prefixed fields
pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut payload = Vec::new();
    let creds = command.credentials();
    put_field(&mut payload, creds.username.as_bytes());
    put_field(&mut payload, creds.password.as_bytes());

    match command {
        Command::Register { .. }
        | Command::Bye { .. }
        | Command::AllUsers { .. }
        | Command::Persist { .. }
        | Command::KvAll { .. }
        | Command::KvTop { .. } => {}
        Command::SetContent { content, .. } => {
            put_field(&mut payload, content);
        }
        Command::GetContent { target, .. } => {
            put_field(&mut payload, target.as_bytes());
        }
        Command::KvInsert { key, value, .. } | Command::KvUpsert { key, value, .. } => {
            put_field(&mut payload, key.as_bytes());
            put_field(&mut payload, value);
        }
        Command::KvGet { key, .. } | Command::KvDelete { key, .. } => {
            put_field(&mut payload, key.as_bytes());
        }
        Command::FuncRegister { name, object, .. } => {
            put_field(&mut payload, name.as_bytes());
            put_field(&mut payload, object);
        }
        Command::FuncInvoke { name, .. } => {
            put_field(&mut payload, name.as_bytes());
        }
    }

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(command.command_type() as u8);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&payload);
    message
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (tag, payload) = split_frame(bytes)?;
    let mut fields = FieldReader::new(payload);
    let creds = Credentials {
        username: fields.string()?,
        password: fields.string()?,
    };

    let command = match tag {
        0x01 => Command::Register { creds },
        0x02 => Command::Bye { creds },
        0x03 => Command::SetContent {
            creds,
            content: fields.bytes()?.to_vec(),
        },
        0x04 => Command::GetContent {
            creds,
            target: fields.string()?,
        },
        0x05 => Command::AllUsers { creds },
        0x06 => Command::Persist { creds },
        0x10 => Command::KvInsert {
            creds,
            key: fields.string()?,
            value: fields.bytes()?.to_vec(),
        },
        0x11 => Command::KvUpsert {
            creds,
            key: fields.string()?,
            value: fields.bytes()?.to_vec(),
        },
        0x12 => Command::KvGet {
            creds,
            key: fields.string()?,
        },
        0x13 => Command::KvDelete {
            creds,
            key: fields.string()?,
        },
        0x14 => Command::KvAll { creds },
        0x15 => Command::KvTop { creds },
        0x20 => Command::FuncRegister {
            creds,
            name: fields.string()?,
            object: fields.bytes()?.to_vec(),
        },
        0x21 => Command::FuncInvoke {
            creds,
            name: fields.string()?,
        },
        _ => {
            return Err(VaultError::Protocol(format!(
                "unknown command type: 0x{tag:02x}"
            )))
        }
    };

    fields.finish()?;
    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(response.status as u8);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);
    message
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes)?;

    let status = Status::from_byte(status_byte).ok_or_else(|| {
        VaultError::Protocol(format!("unknown response status: 0x{status_byte:02x}"))
    })?;

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Frame and field helpers
// =============================================================================

/// Split a complete frame into its tag byte and payload
fn split_frame(bytes: &[u8]) -> Result<(u8, &[u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(VaultError::Protocol(format!(
            "incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let tag = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(VaultError::Protocol(format!(
            "payload too large: {payload_len} bytes (max {MAX_PAYLOAD_SIZE})"
        )));
    }

    if bytes.len() != HEADER_SIZE + payload_len {
        return Err(VaultError::Protocol(format!(
            "frame length mismatch: header says {}, got {}",
            HEADER_SIZE + payload_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..]))
}

/// Sequential reader over the length-prefixed fields of one frame
struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Read one length-prefixed field
    fn bytes(&mut self) -> Result<&'a [u8]> {
        if self.buf.len() - self.pos < 4 {
            return Err(VaultError::Protocol(
                "missing field length prefix".to_string(),
            ));
        }
        let len = u32::from_be_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]) as usize;
        self.pos += 4;

        if self.buf.len() - self.pos < len {
            return Err(VaultError::Protocol(format!(
                "incomplete field: expected {} bytes, got {}",
                len,
                self.buf.len() - self.pos
            )));
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Read one UTF-8 field
    fn string(&mut self) -> Result<String> {
        let bytes = self.bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| VaultError::Protocol("non-UTF-8 string field".to_string()))
    }

    /// Assert the payload was fully consumed
    fn finish(self) -> Result<()> {
        if self.pos != self.buf.len() {
            return Err(VaultError::Protocol(format!(
                "{} trailing bytes in command payload",
                self.buf.len() - self.pos
            )));
        }
        Ok(())
    }
}

fn put_field(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let frame = read_frame(reader)?;
    decode_command(&frame)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let frame = read_frame(reader)?;
    decode_response(&frame)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read one complete frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(VaultError::Protocol(format!(
            "payload too large: {payload_len} bytes (max {MAX_PAYLOAD_SIZE})"
        )));
    }

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload_len);
    frame.extend_from_slice(&header);
    if payload_len > 0 {
        let mut payload = vec![0u8; payload_len];
        reader.read_exact(&mut payload)?;
        frame.extend_from_slice(&payload);
    }
    Ok(frame)
}
