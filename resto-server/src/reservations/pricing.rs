//! Service pricing for reservations

use rust_decimal::Decimal;
use shared::models::{ServiceBooking, ServiceKind};

/// Rates and bulk discount rule, loaded from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationPricing {
    pub billiards_hourly_rate: Decimal,
    pub pool_guest_rate: Decimal,
    pub event_guest_rate: Decimal,
    /// Guests from which per-guest services get the bulk discount
    pub bulk_guest_threshold: u32,
    /// Hours from which hourly services get the bulk discount
    pub bulk_hour_threshold: u32,
    pub bulk_discount_percent: Decimal,
}

impl Default for ReservationPricing {
    fn default() -> Self {
        Self {
            billiards_hourly_rate: Decimal::new(2000, 2),
            pool_guest_rate: Decimal::new(1500, 2),
            event_guest_rate: Decimal::new(3500, 2),
            bulk_guest_threshold: 10,
            bulk_hour_threshold: 4,
            bulk_discount_percent: Decimal::new(10, 0),
        }
    }
}

impl ReservationPricing {
    /// Deterministic price of a service booking, rounded to 2 dp
    ///
    /// Billiards is billed per hour (1 hour when unspecified); pool and
    /// events per guest.
    pub fn price(&self, service: &ServiceBooking, party_size: u32) -> Decimal {
        let (rate, units, threshold) = match service.kind {
            ServiceKind::Billiards => (
                self.billiards_hourly_rate,
                service.duration_hours.unwrap_or(1),
                self.bulk_hour_threshold,
            ),
            ServiceKind::Pool => (self.pool_guest_rate, party_size, self.bulk_guest_threshold),
            ServiceKind::Event => (self.event_guest_rate, party_size, self.bulk_guest_threshold),
        };

        let mut price = rate * Decimal::from(units);
        if threshold > 0 && units >= threshold {
            price -= price * self.bulk_discount_percent / Decimal::ONE_HUNDRED;
        }
        price.round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(kind: ServiceKind, hours: Option<u32>) -> ServiceBooking {
        ServiceBooking {
            kind,
            duration_hours: hours,
        }
    }

    #[test]
    fn test_hourly_and_per_guest() {
        let pricing = ReservationPricing::default();
        assert_eq!(
            pricing.price(&booking(ServiceKind::Billiards, Some(2)), 6),
            Decimal::new(4000, 2)
        );
        assert_eq!(
            pricing.price(&booking(ServiceKind::Billiards, None), 2),
            Decimal::new(2000, 2)
        );
        assert_eq!(
            pricing.price(&booking(ServiceKind::Pool, None), 3),
            Decimal::new(4500, 2)
        );
    }

    #[test]
    fn test_bulk_discount_at_threshold() {
        let pricing = ReservationPricing::default();
        // 4h × 20.00 = 80.00, minus 10%
        assert_eq!(
            pricing.price(&booking(ServiceKind::Billiards, Some(4)), 2),
            Decimal::new(7200, 2)
        );
        // 9 guests: no discount; 10 guests: 350.00 - 35.00
        assert_eq!(
            pricing.price(&booking(ServiceKind::Event, None), 9),
            Decimal::new(31500, 2)
        );
        assert_eq!(
            pricing.price(&booking(ServiceKind::Event, None), 10),
            Decimal::new(31500, 2)
        );
    }

    #[test]
    fn test_zero_threshold_disables_discount() {
        let pricing = ReservationPricing {
            bulk_guest_threshold: 0,
            ..Default::default()
        };
        assert_eq!(
            pricing.price(&booking(ServiceKind::Pool, None), 20),
            Decimal::new(30000, 2)
        );
    }
}
