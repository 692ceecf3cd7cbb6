//! Static product and user catalog.
//!
//! # Data Flow
//! ```text
//! data.rs (built-in entries)
//!     → Catalog::builtin() at startup
//!     → shared read-only via Arc by every request
//!     → selection helpers draw from an explicit RNG
//! ```
//!
//! # Design Decisions
//! - Entries are immutable for the process lifetime
//! - Construction rejects empty collections, so selection never fails
//! - Randomness is always passed in, never taken from a global

pub mod data;
pub mod types;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

pub use types::{Product, Tier, User};

/// Reasons a catalog cannot be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog has no products")]
    NoProducts,
    #[error("catalog has no users")]
    NoUsers,
}

/// Read-only reference data shared by all requests.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    users: Vec<User>,
}

impl Catalog {
    /// Create a catalog from explicit entries.
    pub fn new(products: Vec<Product>, users: Vec<User>) -> Result<Self, CatalogError> {
        if products.is_empty() {
            return Err(CatalogError::NoProducts);
        }
        if users.is_empty() {
            return Err(CatalogError::NoUsers);
        }
        Ok(Self { products, users })
    }

    /// The catalog shipped with the service.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(data::products(), data::users())
    }

    /// Products in insertion order, optionally restricted to an exact category.
    pub fn list_products(&self, category: Option<&str>) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .collect()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// One user drawn uniformly at random.
    pub fn pick_random_user<R: Rng + ?Sized>(&self, rng: &mut R) -> &User {
        &self.users[rng.gen_range(0..self.users.len())]
    }

    /// Between `min` and `max` distinct products, count drawn uniformly.
    pub fn pick_random_products<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        min: usize,
        max: usize,
    ) -> Vec<&Product> {
        let count = rng.gen_range(min..=max.max(min));
        pick_random_subset(rng, count, &self.products)
    }
}

/// Up to `min(n, of.len())` distinct elements of `of`, in no particular order.
pub fn pick_random_subset<'a, T, R: Rng + ?Sized>(rng: &mut R, n: usize, of: &'a [T]) -> Vec<&'a T> {
    of.choose_multiple(rng, n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_list_products_filters_by_exact_category() {
        let catalog = Catalog::builtin().unwrap();

        let electronics = catalog.list_products(Some("electronics"));
        assert_eq!(electronics.len(), 4);
        assert!(electronics.iter().all(|p| p.category == "electronics"));

        assert!(catalog.list_products(Some("Electronics")).is_empty());
        assert!(catalog.list_products(Some("garden")).is_empty());
    }

    #[test]
    fn test_list_products_keeps_insertion_order() {
        let catalog = Catalog::builtin().unwrap();
        let ids: Vec<u32> = catalog.list_products(None).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_subset_is_distinct_and_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = [1, 2, 3, 4, 5];

        for n in 0..8 {
            let picked = pick_random_subset(&mut rng, n, &items);
            assert_eq!(picked.len(), n.min(items.len()));
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), picked.len());
        }
    }

    #[test]
    fn test_random_products_count_within_range() {
        let catalog = Catalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let picked = catalog.pick_random_products(&mut rng, 1, 3);
            assert!((1..=3).contains(&picked.len()));
        }
    }

    #[test]
    fn test_random_user_eventually_covers_everyone() {
        let catalog = Catalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let seen: HashSet<u32> = (0..200).map(|_| catalog.pick_random_user(&mut rng).id).collect();
        assert_eq!(seen.len(), catalog.users().len());
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.products().len(), 6);
        assert_eq!(catalog.users().len(), 4);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert_eq!(Catalog::new(vec![], data::users()).unwrap_err(), CatalogError::NoProducts);
        assert_eq!(Catalog::new(data::products(), vec![]).unwrap_err(), CatalogError::NoUsers);
    }

    #[test]
    fn test_builtin_users_have_tiers() {
        let catalog = Catalog::builtin().unwrap();
        let premium = catalog.users().iter().filter(|u| u.tier == Tier::Premium).count();
        assert_eq!(premium, 2);
        assert_eq!(catalog.users()[0].email, "alice@example.com");
    }
}
