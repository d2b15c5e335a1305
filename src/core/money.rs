use rust_decimal::Decimal;

/// All amounts are Indian rupees with paise precision. The platform is
/// single-currency; amounts are stored and exchanged as plain decimals.
pub const INR_SCALE: u32 = 2;

/// Rounds an amount to paise precision.
pub fn round(amount: Decimal) -> Decimal {
    amount.round_dp(INR_SCALE)
}

/// Validates that an amount is non-negative and has at most paise precision.
pub fn validate_amount(amount: Decimal) -> Result<(), String> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative".to_string());
    }

    if amount.scale() > INR_SCALE {
        return Err(format!(
            "Amounts must have at most {} decimal places, got {}",
            INR_SCALE,
            amount.scale()
        ));
    }

    Ok(())
}
