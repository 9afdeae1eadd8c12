//! Booking total calculation.

/// Total owed for a booking: event price plus the selected services.
///
/// A NULL event price counts as zero. `service_prices` holds the prices of
/// the selected service ids that actually exist; ids with no matching service
/// simply contribute nothing. Guest count never scales the total. The result
/// is clamped at zero so bad seed data cannot produce a negative charge.
#[must_use]
pub fn compute_total(event_price: Option<f64>, service_prices: &[f64]) -> f64 {
    let base = event_price.unwrap_or(0.0);
    let services: f64 = service_prices.iter().sum();
    (base + services).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_plus_services() {
        let total = compute_total(Some(100.0), &[20.0, 30.0]);
        assert!((total - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_services_is_event_price() {
        let total = compute_total(Some(100.0), &[]);
        assert!((total - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_service_ids_contribute_nothing() {
        // Unknown ids produce no price rows, so the slice is empty.
        let total = compute_total(Some(100.0), &[]);
        assert!((total - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn null_event_price_counts_as_zero() {
        let total = compute_total(None, &[25.0]);
        assert!((total - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_never_goes_negative() {
        let total = compute_total(Some(-50.0), &[]);
        assert!(total.abs() < f64::EPSILON);
    }
}
