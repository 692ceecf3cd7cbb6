//! Built-in reference data loaded at startup.

use rust_decimal::Decimal;

use crate::catalog::types::{Product, Tier, User};

fn product(id: u32, name: &str, cents: i64, category: &str) -> Product {
    Product {
        id,
        name: name.to_string(),
        price: Decimal::new(cents, 2),
        category: category.to_string(),
    }
}

fn user(id: u32, name: &str, tier: Tier) -> User {
    User {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        tier,
    }
}

pub fn products() -> Vec<Product> {
    vec![
        product(1, "TypeScript Handbook", 3999, "books"),
        product(2, "Mechanical Keyboard", 14999, "electronics"),
        product(3, "Standing Desk", 49999, "furniture"),
        product(4, "Noise Cancelling Headphones", 29999, "electronics"),
        product(5, "Ergonomic Mouse", 7999, "electronics"),
        product(6, "Monitor Light Bar", 5999, "electronics"),
    ]
}

pub fn users() -> Vec<User> {
    vec![
        user(1, "Alice", Tier::Premium),
        user(2, "Bob", Tier::Standard),
        user(3, "Charlie", Tier::Premium),
        user(4, "Diana", Tier::Standard),
    ]
}
