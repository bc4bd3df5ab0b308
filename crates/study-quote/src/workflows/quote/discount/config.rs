use serde::{Deserialize, Serialize};

/// Thresholds and rates for the discount rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountConfig {
    /// Minimum days between today and the start date, inclusive.
    pub early_booking_min_days: i64,
    /// Discount in basis points of the subtotal (500 = 5%).
    pub early_booking_bps: u32,
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            early_booking_min_days: 90,
            early_booking_bps: 500,
        }
    }
}
