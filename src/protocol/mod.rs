//! Protocol Module
//!
//! Defines the wire protocol for client-server communication. The transport
//! below this layer is assumed to deliver authenticated, confidential
//! frames; here the frames themselves are parsed.
//!
//! ## Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │   Fields (4-byte len each)  │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! Every request carries the caller's username and password as its first
//! two fields, followed by the command's own fields.
//!
//! ### Commands
//! - 0x01 REG      - register the credentials as a new account
//! - 0x02 BYE      - stop the server (authenticated)
//! - 0x03 SET      - fields: content
//! - 0x04 GET      - fields: target name
//! - 0x05 ALL      - list registered names
//! - 0x06 PERSIST  - compact the log
//! - 0x10 KVI      - fields: key, value
//! - 0x11 KVU      - fields: key, value
//! - 0x12 KVG      - fields: key
//! - 0x13 KVD      - fields: key
//! - 0x14 KVA      - list live keys
//! - 0x15 KVT      - list top keys
//! - 0x20 KVF      - fields: name, object bytes
//! - 0x21 KMR      - fields: name
//!
//! ## Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! Status bytes map one-to-one onto the protocol's result codes (OK,
//! OKINS, OKUPD, ERR_LOGIN, ...); list payloads are newline-joined.

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType, Credentials};
pub use response::{Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response,
};
