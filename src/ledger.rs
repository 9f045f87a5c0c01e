//! Pure pricing arithmetic for repair lines, carts and receipts.
//!
//! All math runs on snapshot prices carried by the lines themselves;
//! the live catalog is never consulted here. Amounts are whole
//! currency units, rounded half-up at the final total only.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{CartEntry, RepairLine};

/// Total for a single repair line: snapshot service price plus
/// snapshot spare-part price times quantity, each 0 when absent.
pub fn line_total(line: &RepairLine) -> Decimal {
    let service = line.service_price.unwrap_or(Decimal::ZERO);
    let parts = line.spare_part_price.unwrap_or(Decimal::ZERO) * Decimal::from(line.quantity);
    service + parts
}

/// Pre-VAT subtotal of a repair order's lines.
pub fn order_subtotal(lines: &[RepairLine]) -> Decimal {
    lines.iter().map(line_total).sum()
}

/// Pre-VAT subtotal of a cart snapshot.
pub fn cart_subtotal(entries: &[CartEntry]) -> Decimal {
    entries
        .iter()
        .map(|e| e.unit_price * Decimal::from(e.quantity))
        .sum()
}

/// Applies VAT and rounds half-up to a whole currency unit.
pub fn apply_vat(subtotal: Decimal, vat_rate: Decimal) -> Decimal {
    round_total(subtotal * (Decimal::ONE + vat_rate))
}

/// Recovers the pre-VAT subtotal from a gateway-settled gross amount.
pub fn subtotal_before_vat(total: Decimal, vat_rate: Decimal) -> Decimal {
    round_total(total / (Decimal::ONE + vat_rate))
}

fn round_total(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn line(
        quantity: i32,
        service_price: Option<Decimal>,
        spare_part_price: Option<Decimal>,
    ) -> RepairLine {
        RepairLine::new(
            Uuid::new_v4(),
            None,
            service_price.map(|_| Uuid::new_v4()),
            spare_part_price.map(|_| Uuid::new_v4()),
            quantity,
            service_price,
            spare_part_price,
        )
    }

    #[test]
    fn test_line_total_service_only() {
        assert_eq!(line_total(&line(1, Some(dec!(200)), None)), dec!(200));
    }

    #[test]
    fn test_line_total_parts_only() {
        assert_eq!(line_total(&line(3, None, Some(dec!(50)))), dec!(150));
    }

    #[test]
    fn test_line_total_combined() {
        // Quantity multiplies the part price, never the labor.
        assert_eq!(line_total(&line(2, Some(dec!(100)), Some(dec!(40)))), dec!(180));
    }

    #[test]
    fn test_order_subtotal_sums_lines() {
        let lines = vec![
            line(1, Some(dec!(100)), None),
            line(2, None, Some(dec!(50))),
        ];
        assert_eq!(order_subtotal(&lines), dec!(200));
    }

    #[test]
    fn test_cart_subtotal() {
        let entries = vec![
            CartEntry {
                spare_part_id: Uuid::new_v4(),
                quantity: 2,
                unit_price: dec!(50),
            },
            CartEntry {
                spare_part_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: dec!(30),
            },
        ];
        assert_eq!(cart_subtotal(&entries), dec!(130));
    }

    #[test]
    fn test_apply_vat() {
        assert_eq!(apply_vat(dec!(100), dec!(0.1)), dec!(110));
    }

    #[test]
    fn test_apply_vat_rounds_half_up_on_final_total() {
        // 105 * 1.1 = 115.5 rounds up to 116.
        assert_eq!(apply_vat(dec!(105), dec!(0.1)), dec!(116));
    }

    #[test]
    fn test_subtotal_before_vat() {
        assert_eq!(subtotal_before_vat(dec!(110), dec!(0.1)), dec!(100));
    }

    #[test]
    fn test_vat_round_trip_on_whole_units() {
        let subtotal = dec!(250_000);
        let total = apply_vat(subtotal, dec!(0.1));
        assert_eq!(total, dec!(275_000));
        assert_eq!(subtotal_before_vat(total, dec!(0.1)), subtotal);
    }

    #[test]
    fn test_intermediate_lines_are_not_rounded() {
        // Fractional snapshot prices stay exact until the VAT total.
        let lines = vec![line(3, None, Some(dec!(33.4)))];
        assert_eq!(order_subtotal(&lines), dec!(100.2));
        assert_eq!(apply_vat(dec!(100.2), dec!(0.1)), dec!(110));
    }
}
