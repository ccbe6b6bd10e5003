//! Product record

use std::fmt;

use serde::{Deserialize, Serialize};

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Assigned by the catalog; zero (or absent on the wire) when adding
    #[serde(default)]
    pub id: u64,

    pub name: String,

    /// Price in minor currency units
    pub price: i64,
}

impl Product {
    /// A product that has not been assigned an id yet
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            price,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product{{ ID: {}, Name: {}, Price: {} }}",
            self.id, self.name, self.price
        )
    }
}
