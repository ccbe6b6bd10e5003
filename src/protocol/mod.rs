//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format
//!
//! Every message is two text lines, each terminated by CRLF:
//!
//! ```text
//! ┌────────────────────┬──────┐
//! │ type (decimal)     │ \r\n │
//! ├────────────────────┼──────┤
//! │ payload (verbatim) │ \r\n │
//! └────────────────────┴──────┘
//! ```
//!
//! There is no length field and no checksum. The payload therefore must not
//! contain CRLF; the encoder refuses such payloads.
//!
//! Apart from the two reserved types (`0` invalid, `1` error) the transport
//! never interprets `type` or the payload. Opcode tables and payload shapes
//! belong to the application (see [`crate::market`]).

mod codec;
mod message;
mod writer;

pub use codec::{
    decode_message, encode_message, read_message, validate_payload, write_message, CRLF,
    MAX_LINE_LEN, MAX_TYPE_LINE_LEN,
};
pub use message::{Message, KIND_ERROR, KIND_INVALID};
pub use writer::MessageWriter;
