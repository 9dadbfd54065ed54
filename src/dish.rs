use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::group::is_upper;

/// Price shown when a dish carries no currency token.
pub const UNKNOWN_PRICE: &str = "$X";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRecord {
    pub category: String,
    pub dish_name: String,
    pub price: String,
    pub description: String,
    pub dish_id: String,
}

/// Run-wide dish identifier source. Never resets between documents.
#[derive(Debug)]
pub struct DishIdCounter {
    next: AtomicU64,
}

impl DishIdCounter {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> String {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{id:03}")
    }

    /// Skips `by` identifiers, as if that many dishes had been numbered.
    pub fn advance(&self, by: u64) {
        self.next.fetch_add(by, Ordering::Relaxed);
    }

    /// The identifier the next dish will receive.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for DishIdCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits one dish fragment into name, price and description and stamps it
/// with the next identifier.
pub fn build_record(
    category: &str,
    fragment: &str,
    currency_marker: char,
    ids: &DishIdCounter,
) -> DishRecord {
    let mut name = Vec::new();
    let mut price: Option<&str> = None;
    let mut description = Vec::new();

    for token in fragment.split_whitespace() {
        if token.contains(currency_marker) {
            price = Some(token);
        } else if is_upper(token) {
            name.push(token);
        } else {
            description.push(token);
        }
    }

    DishRecord {
        category: category.to_string(),
        dish_name: name.join(" "),
        price: price.unwrap_or(UNKNOWN_PRICE).to_string(),
        description: description.join(" "),
        dish_id: ids.next_id(),
    }
}
