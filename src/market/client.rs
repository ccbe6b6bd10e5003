//! Typed client for the market protocol

use crate::error::{MtpError, Result};
use crate::network::Client;

use super::{MarketMessage, Opcode, Payload, Product};

/// Wraps a [`Client`] with one method per market request
pub struct MarketClient {
    client: Client,
}

impl MarketClient {
    /// Connect to a market server
    pub fn dial(addr: &str) -> Result<Self> {
        Ok(Self::from_client(Client::dial(addr)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch the whole catalog
    pub fn products(&mut self) -> Result<Vec<Product>> {
        match self.call(MarketMessage::product_list_request())? {
            Payload::Records(products) => Ok(products),
            other => Err(unexpected_reply(Opcode::ProductListRequest, &other)),
        }
    }

    /// Fetch one product by id
    pub fn product(&mut self, id: u64) -> Result<Product> {
        match self.call(MarketMessage::product_request(id))? {
            Payload::Record(product) => Ok(product),
            other => Err(unexpected_reply(Opcode::ProductRequest, &other)),
        }
    }

    /// Add a product; the returned copy carries the assigned id
    pub fn add_product(&mut self, product: Product) -> Result<Product> {
        match self.call(MarketMessage::product_add(product))? {
            Payload::Record(product) => Ok(product),
            other => Err(unexpected_reply(Opcode::ProductAdd, &other)),
        }
    }

    /// Send a request and decode its reply; `Error` replies become
    /// [`MtpError::Market`]
    fn call(&mut self, request: MarketMessage) -> Result<Payload> {
        let reply = self.client.request(&request.encode()?)?;
        let reply = MarketMessage::decode(&reply)?;

        match (reply.opcode, reply.payload) {
            (Opcode::Error, Payload::Text(text)) => Err(MtpError::Market(text)),
            (_, payload) => Ok(payload),
        }
    }

    /// Underlying transport client
    pub fn inner_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    pub fn close(self) -> Result<()> {
        self.client.close()
    }
}

fn unexpected_reply(request: Opcode, payload: &Payload) -> MtpError {
    MtpError::InvalidPayload(format!("unexpected reply to {}: {:?}", request, payload))
}
