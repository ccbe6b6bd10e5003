//! Market Message Tests

use mtp::market::{MarketMessage, Opcode, Payload, Product};
use mtp::protocol::Message;
use mtp::MtpError;

fn banana() -> Product {
    Product {
        id: 1,
        name: "Banana".to_string(),
        price: 1500,
    }
}

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn test_decode_product_request() {
    let decoded = MarketMessage::decode(&Message::new(100, "42")).unwrap();
    assert_eq!(decoded, MarketMessage::product_request(42));
}

#[test]
fn test_decode_product_list_request() {
    let decoded = MarketMessage::decode(&Message::new(101, "")).unwrap();
    assert_eq!(decoded.opcode, Opcode::ProductListRequest);
    assert_eq!(decoded.payload, Payload::None);
}

#[test]
fn test_decode_product_list_request_rejects_payload() {
    let result = MarketMessage::decode(&Message::new(101, "anything"));
    assert!(matches!(result, Err(MtpError::InvalidPayload(_))));
}

#[test]
fn test_decode_product_add_without_id() {
    let decoded =
        MarketMessage::decode(&Message::new(104, r#"{"name":"Apple","price":300}"#)).unwrap();
    assert_eq!(decoded, MarketMessage::product_add(Product::new("Apple", 300)));
}

#[test]
fn test_decode_product_list() {
    let raw = r#"[{"id":1,"name":"Banana","price":1500},{"id":2,"name":"Carrot","price":1400}]"#;
    let decoded = MarketMessage::decode(&Message::new(103, raw)).unwrap();

    match decoded.payload {
        Payload::Records(products) => {
            assert_eq!(products.len(), 2);
            assert_eq!(products[0], banana());
            assert_eq!(products[1].name, "Carrot");
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_decode_error_keeps_text() {
    let decoded = MarketMessage::decode(&Message::new(1, "product 9 not found")).unwrap();
    assert_eq!(decoded, MarketMessage::error("product 9 not found"));
}

#[test]
fn test_decode_unknown_opcode() {
    let result = MarketMessage::decode(&Message::new(999, ""));
    assert!(matches!(result, Err(MtpError::UnknownOpcode(999))));
}

#[test]
fn test_decode_bad_ids() {
    for raw in ["", "abc", "-1", "1.5", " 1", "99999999999999999999999"] {
        let result = MarketMessage::decode(&Message::new(100, raw));
        assert!(
            matches!(result, Err(MtpError::InvalidPayload(_))),
            "accepted id {:?}",
            raw
        );
    }
}

#[test]
fn test_decode_bad_records() {
    for raw in ["", "{", r#"{"name":"Apple"}"#, r#"{"name":"Apple","price":"x"}"#, "[]"] {
        let result = MarketMessage::decode(&Message::new(104, raw));
        assert!(
            matches!(result, Err(MtpError::InvalidPayload(_))),
            "accepted record {:?}",
            raw
        );
    }
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_encode_product_request() {
    let message = MarketMessage::product_request(7).encode().unwrap();
    assert_eq!(message, Message::new(100, "7"));
}

#[test]
fn test_encode_product_list_request_is_empty() {
    let message = MarketMessage::product_list_request().encode().unwrap();
    assert_eq!(message, Message::new(101, ""));
}

#[test]
fn test_encode_product_is_json() {
    let message = MarketMessage::product(banana()).encode().unwrap();
    assert_eq!(message.kind, 102);
    assert_eq!(message.payload, r#"{"id":1,"name":"Banana","price":1500}"#);
}

#[test]
fn test_encoded_record_stays_on_one_line() {
    let product = Product::new("line\r\nbreak", 1);
    let message = MarketMessage::product_add(product.clone()).encode().unwrap();

    assert!(!message.payload.contains('\n'));
    assert_eq!(
        MarketMessage::decode(&message).unwrap(),
        MarketMessage::product_add(product)
    );
}

#[test]
fn test_opcode_display() {
    assert_eq!(Opcode::ProductAdd.to_string(), "ProductAdd(104)");
    assert_eq!(Opcode::Error.to_string(), "Error(1)");
}

#[test]
fn test_product_display() {
    assert_eq!(
        banana().to_string(),
        "Product{ ID: 1, Name: Banana, Price: 1500 }"
    );
}
