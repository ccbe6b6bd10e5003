//! Typed market messages
//!
//! Maps the transport's `(type, payload string)` pairs onto [`Opcode`] and a
//! [`Payload`] variant, validating the payload shape at decode time.
//!
//! | Opcode             | Code | Payload           | Wire payload        |
//! |--------------------|------|-------------------|---------------------|
//! | Invalid            | 0    | `None`            | ignored             |
//! | Error              | 1    | `Text`            | message text        |
//! | ProductRequest     | 100  | `Id`              | decimal id          |
//! | ProductListRequest | 101  | `None`            | empty               |
//! | Product            | 102  | `Record`          | JSON object         |
//! | ProductList        | 103  | `Records`         | JSON array          |
//! | ProductAdd         | 104  | `Record`          | JSON object         |

use std::fmt;

use crate::error::{MtpError, Result};
use crate::protocol::{Message, KIND_ERROR, KIND_INVALID};

use super::Product;

/// Message types understood by the market server and client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum Opcode {
    Invalid = KIND_INVALID,
    Error = KIND_ERROR,
    ProductRequest = 100,
    ProductListRequest = 101,
    Product = 102,
    ProductList = 103,
    ProductAdd = 104,
}

impl Opcode {
    /// Every opcode, in table order
    pub const ALL: [Opcode; 7] = [
        Opcode::Invalid,
        Opcode::Error,
        Opcode::ProductRequest,
        Opcode::ProductListRequest,
        Opcode::Product,
        Opcode::ProductList,
        Opcode::ProductAdd,
    ];

    /// Wire value
    pub fn code(self) -> u64 {
        self as u64
    }

    /// Look up the opcode for a wire value
    pub fn from_code(code: u64) -> Option<Opcode> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    fn shape(self) -> Shape {
        match self {
            Opcode::Invalid | Opcode::ProductListRequest => Shape::None,
            Opcode::Error => Shape::Text,
            Opcode::ProductRequest => Shape::Id,
            Opcode::Product | Opcode::ProductAdd => Shape::Record,
            Opcode::ProductList => Shape::Records,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    None,
    Id,
    Record,
    Records,
    Text,
}

/// Decoded payload, selected by opcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    None,
    Id(u64),
    Record(Product),
    Records(Vec<Product>),
    Text(String),
}

impl Payload {
    fn shape(&self) -> Shape {
        match self {
            Payload::None => Shape::None,
            Payload::Id(_) => Shape::Id,
            Payload::Record(_) => Shape::Record,
            Payload::Records(_) => Shape::Records,
            Payload::Text(_) => Shape::Text,
        }
    }
}

/// A message with its opcode and payload resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketMessage {
    pub opcode: Opcode,
    pub payload: Payload,
}

impl MarketMessage {
    pub fn product_request(id: u64) -> Self {
        Self {
            opcode: Opcode::ProductRequest,
            payload: Payload::Id(id),
        }
    }

    pub fn product_list_request() -> Self {
        Self {
            opcode: Opcode::ProductListRequest,
            payload: Payload::None,
        }
    }

    pub fn product(product: Product) -> Self {
        Self {
            opcode: Opcode::Product,
            payload: Payload::Record(product),
        }
    }

    pub fn product_list(products: Vec<Product>) -> Self {
        Self {
            opcode: Opcode::ProductList,
            payload: Payload::Records(products),
        }
    }

    pub fn product_add(product: Product) -> Self {
        Self {
            opcode: Opcode::ProductAdd,
            payload: Payload::Record(product),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            opcode: Opcode::Error,
            payload: Payload::Text(text.into()),
        }
    }

    /// Resolve a transport message
    ///
    /// Fails with [`MtpError::UnknownOpcode`] for types outside the table and
    /// [`MtpError::InvalidPayload`] when the payload does not fit the opcode.
    pub fn decode(message: &Message) -> Result<Self> {
        let opcode = Opcode::from_code(message.kind).ok_or(MtpError::UnknownOpcode(message.kind))?;
        let raw = message.payload.as_str();

        let payload = match opcode.shape() {
            Shape::None => {
                if opcode == Opcode::ProductListRequest && !raw.is_empty() {
                    return Err(MtpError::InvalidPayload(format!(
                        "{} takes no payload",
                        opcode
                    )));
                }
                Payload::None
            }
            Shape::Id => Payload::Id(parse_id(raw)?),
            Shape::Record => Payload::Record(serde_json::from_str(raw).map_err(|e| {
                MtpError::InvalidPayload(format!("bad product record: {}", e))
            })?),
            Shape::Records => Payload::Records(serde_json::from_str(raw).map_err(|e| {
                MtpError::InvalidPayload(format!("bad product list: {}", e))
            })?),
            Shape::Text => Payload::Text(raw.to_string()),
        };

        Ok(Self { opcode, payload })
    }

    /// Build the transport message
    ///
    /// Fails with [`MtpError::InvalidPayload`] if the payload variant does not
    /// match the opcode.
    pub fn encode(&self) -> Result<Message> {
        if self.opcode.shape() != self.payload.shape() {
            return Err(MtpError::InvalidPayload(format!(
                "{} cannot carry a {:?} payload",
                self.opcode,
                self.payload.shape()
            )));
        }

        let raw = match &self.payload {
            Payload::None => String::new(),
            Payload::Id(id) => id.to_string(),
            Payload::Record(product) => to_json(product)?,
            Payload::Records(products) => to_json(products)?,
            Payload::Text(text) => text.clone(),
        };

        Ok(Message::new(self.opcode.code(), raw))
    }
}

fn parse_id(raw: &str) -> Result<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MtpError::InvalidPayload(format!("bad product id: {:?}", raw)));
    }
    raw.parse()
        .map_err(|e| MtpError::InvalidPayload(format!("bad product id {:?}: {}", raw, e)))
}

// Compact JSON escapes control characters, so the result is always one line
fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| MtpError::InvalidPayload(format!("cannot encode payload: {}", e)))
}
