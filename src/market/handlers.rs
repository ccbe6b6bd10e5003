//! Market request handlers
//!
//! Builds the [`Router`] the server runs with. Every failure (bad payload,
//! missing product, storage error) turns into an `Error` reply; nothing
//! escapes to the transport.

use std::sync::Arc;

use crate::error::{MtpError, Result};
use crate::network::{ResponseWriter, Router};
use crate::protocol::Message;

use super::{Market, MarketMessage, Opcode, Payload};

/// Dispatch table for the market protocol
///
/// Unrouted opcodes (including replies such as `Product` sent to the server)
/// get the router's default `Error` reply.
pub fn router(market: Arc<Market>) -> Router {
    let list = Arc::clone(&market);
    let get = Arc::clone(&market);
    let add = market;

    Router::new()
        .route_fn(Opcode::ProductListRequest.code(), move |w, m| {
            reply(w, handle_product_list(&list, m))
        })
        .route_fn(Opcode::ProductRequest.code(), move |w, m| {
            reply(w, handle_product(&get, m))
        })
        .route_fn(Opcode::ProductAdd.code(), move |w, m| {
            reply(w, handle_product_add(&add, m))
        })
}

fn handle_product_list(market: &Market, message: &Message) -> Result<MarketMessage> {
    MarketMessage::decode(message)?;
    let products = market.products()?;
    Ok(MarketMessage::product_list(products))
}

fn handle_product(market: &Market, message: &Message) -> Result<MarketMessage> {
    match MarketMessage::decode(message)?.payload {
        Payload::Id(id) => Ok(MarketMessage::product(market.product(id)?)),
        other => Err(unexpected(Opcode::ProductRequest, &other)),
    }
}

fn handle_product_add(market: &Market, message: &Message) -> Result<MarketMessage> {
    match MarketMessage::decode(message)?.payload {
        Payload::Record(product) => {
            let product = market.add_product(product)?;
            tracing::info!("Added {}", product);
            Ok(MarketMessage::product(product))
        }
        other => Err(unexpected(Opcode::ProductAdd, &other)),
    }
}

fn unexpected(opcode: Opcode, payload: &Payload) -> MtpError {
    MtpError::InvalidPayload(format!("{} decoded to {:?}", opcode, payload))
}

/// Send the handler's outcome, converting failures into an `Error` reply
fn reply(writer: &mut ResponseWriter<'_>, outcome: Result<MarketMessage>) {
    let sent = match outcome.and_then(|m| m.encode()) {
        Ok(message) => writer.write_message(&message),
        Err(e) => {
            tracing::warn!("Request failed: {}", e);
            writer.write_error(&e)
        }
    };

    if let Err(e) = sent {
        tracing::warn!("Failed to send reply: {}", e);
    }
}
