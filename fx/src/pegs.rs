//! Pegged-currency lookup table.

use std::collections::HashMap;

use exrate_common::{Currency, PeggedCurrency};
use rust_decimal::Decimal;
use tracing::warn;

/// `currency -> (pegged_to, rate)` mapping built from peg declarations.
#[derive(Debug, Clone, Default)]
pub struct PegTable {
    pegs: HashMap<Currency, (Currency, Decimal)>,
}

impl PegTable {
    /// Build a table. Later declarations for the same currency replace earlier
    /// ones; self-pegs and non-positive rates are skipped.
    pub fn from_declarations(declarations: impl IntoIterator<Item = PeggedCurrency>) -> Self {
        let mut pegs = HashMap::new();
        for peg in declarations {
            if !peg.is_valid() {
                warn!(
                    currency = %peg.currency,
                    pegged_to = %peg.pegged_to,
                    rate = %peg.rate,
                    "Skipping invalid peg declaration"
                );
                continue;
            }
            pegs.insert(peg.currency, (peg.pegged_to, peg.rate));
        }
        Self { pegs }
    }

    /// The peg target and fixed rate for `currency`, if pegged.
    pub fn get(&self, currency: Currency) -> Option<(Currency, Decimal)> {
        self.pegs.get(&currency).copied()
    }

    pub fn len(&self) -> usize {
        self.pegs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pegs.is_empty()
    }
}
