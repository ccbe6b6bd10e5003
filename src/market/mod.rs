//! Market Module
//!
//! The product catalog application carried over MTP.
//!
//! ## Responsibilities
//! - Opcode table and typed payloads ([`MarketMessage`])
//! - Catalog business rules ([`Market`]) over a [`ProductService`]
//! - In-memory storage ([`MemoryProductService`])
//! - Server-side dispatch ([`router`]) and a typed client ([`MarketClient`])

mod client;
mod handlers;
mod memory;
mod message;
mod product;
mod service;

pub use client::MarketClient;
pub use handlers::router;
pub use memory::MemoryProductService;
pub use message::{MarketMessage, Opcode, Payload};
pub use product::Product;
pub use service::{Market, ProductService};
