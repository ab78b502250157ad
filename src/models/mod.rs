// src/models/mod.rs

pub mod brewery;
pub mod equipment;
pub mod inventory;
pub mod price_history;
pub mod recipe;
pub mod schedule;
pub mod session;
pub mod source;
pub mod user;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Shared custom validator for decimal amounts (cost, price, ABV, batch
/// size) that must not be negative.
pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("value must not be negative".into());
        return Err(err);
    }
    Ok(())
}
