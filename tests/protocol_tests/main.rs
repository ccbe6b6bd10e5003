//! Protocol Tests
