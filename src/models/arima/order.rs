//! Non-seasonal and seasonal model orders.

use std::fmt;

/// Non-seasonal ARIMA order (p, d, q).
///
/// Orders compare lexicographically on `(p, d, q)`, which is the order the
/// parameter search enumerates them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Order {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl Order {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Seasonal order (P, D, Q) at period s.
///
/// A period of 0 means no seasonality; the seasonal terms are then ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeasonalOrder {
    /// Seasonal AR order (P)
    pub p: usize,
    /// Seasonal differencing order (D)
    pub d: usize,
    /// Seasonal MA order (Q)
    pub q: usize,
    /// Seasonal period (s)
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// The absent seasonal component, (0,0,0) at period 0.
    pub fn none() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Whether any seasonal term is requested.
    pub fn has_terms(&self) -> bool {
        self.p > 0 || self.d > 0 || self.q > 0
    }

    /// Whether the order describes an actual seasonal component.
    pub fn is_seasonal(&self) -> bool {
        self.period > 0 && self.has_terms()
    }

    /// Canonical form: period 0 or no terms collapse to [`SeasonalOrder::none`].
    pub fn normalized(self) -> Self {
        if self.is_seasonal() {
            self
        } else {
            Self::none()
        }
    }
}

impl Default for SeasonalOrder {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})[{}]", self.p, self.d, self.q, self.period)
    }
}
