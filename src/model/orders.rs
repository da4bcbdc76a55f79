//! SARIMA order tuple and its bounds.

/// Maximum regular AR and MA orders considered by the engine.
pub const MAX_P: usize = 3;
/// Maximum regular MA order.
pub const MAX_Q: usize = 3;
/// Maximum regular differencing order.
pub const MAX_D: usize = 2;
/// Maximum seasonal AR/MA order.
pub const MAX_BP: usize = 1;
/// Maximum seasonal MA order.
pub const MAX_BQ: usize = 1;
/// Maximum seasonal differencing order.
pub const MAX_BD: usize = 1;

/// Regular and seasonal ARIMA orders `(p, d, q)(P, D, Q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SarimaOrders {
    /// Regular AR order.
    pub p: usize,
    /// Regular differencing order.
    pub d: usize,
    /// Regular MA order.
    pub q: usize,
    /// Seasonal AR order.
    pub bp: usize,
    /// Seasonal differencing order.
    pub bd: usize,
    /// Seasonal MA order.
    pub bq: usize,
}

impl SarimaOrders {
    /// White-noise orders (all zero).
    pub fn none() -> Self {
        Self {
            p: 0,
            d: 0,
            q: 0,
            bp: 0,
            bd: 0,
            bq: 0,
        }
    }

    /// Airline orders: `(0,1,1)` with `(0,1,1)` seasonally when seasonal.
    pub fn airline(seasonal: bool) -> Self {
        Self {
            p: 0,
            d: 1,
            q: 1,
            bp: 0,
            bd: usize::from(seasonal),
            bq: usize::from(seasonal),
        }
    }

    /// Number of free ARMA parameters.
    pub fn free_parameters(&self) -> usize {
        self.p + self.q + self.bp + self.bq
    }

    /// True for the exact airline structure.
    pub fn is_airline(&self, seasonal: bool) -> bool {
        *self == Self::airline(seasonal)
    }

    /// True when the regular part is the airline one, regardless of
    /// seasonal orders.
    pub fn has_airline_regular_part(&self) -> bool {
        self.p == 0 && self.d == 1 && self.q == 1
    }

    /// True when the seasonal part is the airline one.
    pub fn has_airline_seasonal_part(&self) -> bool {
        self.bp == 0 && self.bd == 1 && self.bq == 1
    }

    /// Whether all orders sit within the engine bounds.
    pub fn within_bounds(&self) -> bool {
        self.p <= MAX_P
            && self.d <= MAX_D
            && self.q <= MAX_Q
            && self.bp <= MAX_BP
            && self.bd <= MAX_BD
            && self.bq <= MAX_BQ
    }
}

impl Default for SarimaOrders {
    fn default() -> Self {
        Self::airline(true)
    }
}

impl std::fmt::Display for SarimaOrders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{},{})({},{},{})",
            self.p, self.d, self.q, self.bp, self.bd, self.bq
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn airline_orders() {
        let seasonal = SarimaOrders::airline(true);
        assert_eq!(seasonal.to_string(), "(0,1,1)(0,1,1)");
        assert!(seasonal.is_airline(true));
        assert_eq!(seasonal.free_parameters(), 2);

        let plain = SarimaOrders::airline(false);
        assert_eq!(plain.to_string(), "(0,1,1)(0,0,0)");
        assert_eq!(plain.free_parameters(), 1);
    }

    #[test]
    fn bounds_check() {
        assert!(SarimaOrders::airline(true).within_bounds());
        let too_big = SarimaOrders {
            p: 4,
            ..SarimaOrders::none()
        };
        assert!(!too_big.within_bounds());
    }

    #[test]
    fn airline_part_predicates() {
        let orders = SarimaOrders {
            p: 0,
            d: 1,
            q: 1,
            bp: 1,
            bd: 0,
            bq: 0,
        };
        assert!(orders.has_airline_regular_part());
        assert!(!orders.has_airline_seasonal_part());
    }
}
