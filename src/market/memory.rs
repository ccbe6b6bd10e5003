//! In-memory product service
//!
//! Contents live only as long as the process.

use parking_lot::RwLock;

use crate::error::Result;

use super::{Product, ProductService};

/// Product storage backed by a `Vec`
///
/// ## Concurrency:
/// - `catalog`: RwLock (many concurrent readers, exclusive writer)
pub struct MemoryProductService {
    catalog: RwLock<Catalog>,
}

struct Catalog {
    last_id: u64,
    products: Vec<Product>,
}

impl MemoryProductService {
    /// A catalog seeded with a couple of products
    pub fn new() -> Self {
        Self::with_products(vec![
            Product {
                id: 1,
                name: "Banana".to_string(),
                price: 1500,
            },
            Product {
                id: 2,
                name: "Carrot".to_string(),
                price: 1400,
            },
        ])
    }

    /// An empty catalog
    pub fn empty() -> Self {
        Self::with_products(Vec::new())
    }

    /// A catalog holding `products`; new ids continue after the highest one
    pub fn with_products(products: Vec<Product>) -> Self {
        let last_id = products.iter().map(|p| p.id).max().unwrap_or(0);
        Self {
            catalog: RwLock::new(Catalog { last_id, products }),
        }
    }

    /// Number of stored products
    pub fn len(&self) -> usize {
        self.catalog.read().products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.read().products.is_empty()
    }
}

impl Default for MemoryProductService {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductService for MemoryProductService {
    fn products(&self) -> Result<Vec<Product>> {
        Ok(self.catalog.read().products.clone())
    }

    fn product(&self, id: u64) -> Result<Option<Product>> {
        Ok(self
            .catalog
            .read()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    fn add_product(&self, mut product: Product) -> Result<Product> {
        let mut catalog = self.catalog.write();
        catalog.last_id += 1;
        product.id = catalog.last_id;
        catalog.products.push(product.clone());
        Ok(product)
    }
}
