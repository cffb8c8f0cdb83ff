use serde::{Deserialize, Serialize};

/// A tradeable token as reported by the trending feed.
///
/// Identity is the pair address: two candidates with the same address
/// refer to the same token, whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCandidate {
    /// On-chain pair (or mint) address
    pub pair_address: String,
    /// Display symbol
    pub symbol: String,
    /// Token name, empty when the feed omits it
    pub name: String,
    /// Pool liquidity in USD
    pub liquidity: f64,
    /// Number of unique holders
    pub holders: u64,
    /// Last price in USD, 0.0 when unknown
    pub price: f64,
}

impl TokenCandidate {
    pub fn new(pair_address: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            pair_address: pair_address.into(),
            symbol: symbol.into(),
            name: String::new(),
            liquidity: 0.0,
            holders: 0,
            price: 0.0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_liquidity(mut self, liquidity: f64) -> Self {
        self.liquidity = liquidity;
        self
    }

    pub fn with_holders(mut self, holders: u64) -> Self {
        self.holders = holders;
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// Price usable as an entry reference
    pub fn entry_price(&self) -> Option<f64> {
        (self.price.is_finite() && self.price > 0.0).then_some(self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let token = TokenCandidate::new("Pair1", "BONK");
        assert_eq!(token.name, "");
        assert_eq!(token.liquidity, 0.0);
        assert_eq!(token.holders, 0);
        assert_eq!(token.entry_price(), None);
    }

    #[test]
    fn test_entry_price_requires_positive_finite() {
        assert_eq!(TokenCandidate::new("a", "A").with_price(1.5).entry_price(), Some(1.5));
        assert_eq!(TokenCandidate::new("a", "A").with_price(-1.0).entry_price(), None);
        assert_eq!(TokenCandidate::new("a", "A").with_price(f64::NAN).entry_price(), None);
    }
}
