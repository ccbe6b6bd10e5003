//! Catalog Tests

use std::sync::Arc;
use std::thread;

use mtp::market::{Market, MemoryProductService, Product, ProductService};
use mtp::MtpError;

#[test]
fn test_seeded_catalog() {
    let market = Market::new(MemoryProductService::new());
    let products = market.products().unwrap();

    let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Banana", "Carrot"]);
    assert_eq!(products[0].id, 1);
    assert_eq!(products[1].id, 2);
}

#[test]
fn test_lookup_by_id() {
    let market = Market::new(MemoryProductService::new());
    assert_eq!(market.product(2).unwrap().name, "Carrot");
}

#[test]
fn test_missing_product() {
    let market = Market::new(MemoryProductService::new());
    let err = market.product(99).unwrap_err();

    assert!(matches!(err, MtpError::Market(_)));
    assert!(err.to_string().contains("product 99 not found"));
}

#[test]
fn test_add_assigns_next_id() {
    let market = Market::new(MemoryProductService::new());

    let added = market.add_product(Product::new("Apple", 300)).unwrap();
    assert_eq!(added.id, 3);
    assert_eq!(market.product(3).unwrap(), added);
    assert_eq!(market.products().unwrap().len(), 3);
}

#[test]
fn test_add_ignores_client_id() {
    let market = Market::new(MemoryProductService::empty());
    let product = Product {
        id: 500,
        name: "Apple".to_string(),
        price: 300,
    };

    assert_eq!(market.add_product(product).unwrap().id, 1);
    assert!(market.product(500).is_err());
}

#[test]
fn test_add_validates_fields() {
    let market = Market::new(MemoryProductService::empty());

    assert!(matches!(
        market.add_product(Product::new("  ", 10)),
        Err(MtpError::Market(_))
    ));
    assert!(matches!(
        market.add_product(Product::new("Apple", -1)),
        Err(MtpError::Market(_))
    ));
    assert!(market.products().unwrap().is_empty());

    // Free items are allowed
    assert!(market.add_product(Product::new("Sample", 0)).is_ok());
}

#[test]
fn test_ids_continue_after_seed() {
    let service = MemoryProductService::with_products(vec![Product {
        id: 10,
        name: "Durian".to_string(),
        price: 9900,
    }]);

    let added = service.add_product(Product::new("Eggplant", 250)).unwrap();
    assert_eq!(added.id, 11);
    assert_eq!(service.len(), 2);
}

#[test]
fn test_concurrent_adds_get_unique_ids() {
    let service = Arc::new(MemoryProductService::empty());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        service
                            .add_product(Product::new(format!("item-{}-{}", t, i), i))
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort_unstable();

    assert_eq!(ids, (1..=100).collect::<Vec<u64>>());
    assert_eq!(service.len(), 100);
}
