use uuid::Uuid;

pub type UserId = Uuid;

/// Render a monetary amount for user-visible messages.
/// Amounts are floats end to end, so formatting is fixed to two decimals.
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::format_amount;

    #[test]
    fn amounts_render_with_two_decimals() {
        assert_eq!(format_amount(1200.0), "1200.00");
        assert_eq!(format_amount(0.5), "0.50");
        assert_eq!(format_amount(1234.567), "1234.57");
    }
}
