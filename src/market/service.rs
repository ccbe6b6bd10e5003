//! Product catalog
//!
//! [`Market`] is the business layer the handlers call into; storage sits
//! behind the [`ProductService`] trait.

use crate::error::{MtpError, Result};

use super::Product;

/// Storage backend for products
pub trait ProductService: Send + Sync {
    /// All products, in insertion order
    fn products(&self) -> Result<Vec<Product>>;

    /// One product by id
    fn product(&self, id: u64) -> Result<Option<Product>>;

    /// Store a product, returning it with its assigned id
    fn add_product(&self, product: Product) -> Result<Product>;
}

/// The product catalog
pub struct Market {
    products: Box<dyn ProductService>,
}

impl Market {
    pub fn new(products: impl ProductService + 'static) -> Self {
        Self {
            products: Box::new(products),
        }
    }

    pub fn products(&self) -> Result<Vec<Product>> {
        self.products.products()
    }

    /// Look up a product, failing if it does not exist
    pub fn product(&self, id: u64) -> Result<Product> {
        self.products
            .product(id)?
            .ok_or_else(|| MtpError::Market(format!("product {} not found", id)))
    }

    /// Validate and store a new product
    ///
    /// Any id on the input is ignored; the catalog assigns one.
    pub fn add_product(&self, product: Product) -> Result<Product> {
        if product.name.trim().is_empty() {
            return Err(MtpError::Market("product name must not be empty".to_string()));
        }
        if product.price < 0 {
            return Err(MtpError::Market(format!(
                "product price must not be negative, got {}",
                product.price
            )));
        }
        self.products.add_product(Product { id: 0, ..product })
    }
}
