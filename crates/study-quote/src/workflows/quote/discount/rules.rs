use super::config::DiscountConfig;
use super::{AppliedDiscount, DiscountKind, DiscountRule};
use crate::workflows::quote::domain::{Money, Selection};
use chrono::NaiveDate;

/// Percentage off the subtotal when the program starts far enough ahead.
#[derive(Debug, Clone)]
pub struct EarlyBookingRule {
    min_days: i64,
    bps: u32,
}

impl EarlyBookingRule {
    pub fn from_config(config: &DiscountConfig) -> Self {
        Self {
            min_days: config.early_booking_min_days,
            bps: config.early_booking_bps,
        }
    }
}

impl DiscountRule for EarlyBookingRule {
    fn evaluate(
        &self,
        selection: &Selection,
        subtotal: Money,
        today: NaiveDate,
    ) -> Option<AppliedDiscount> {
        let start_date = selection.start_date?;
        let lead_days = (start_date - today).num_days();
        if lead_days < self.min_days {
            return None;
        }

        let amount = subtotal.percent_bps(self.bps);
        if amount == Money::ZERO {
            return None;
        }

        Some(AppliedDiscount {
            kind: DiscountKind::EarlyBooking,
            amount,
            notes: format!(
                "booked {lead_days} days ahead (minimum {}): {}.{:02}% off",
                self.min_days,
                self.bps / 100,
                self.bps % 100
            ),
        })
    }
}
