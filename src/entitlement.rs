use crate::error::AppError;

/// Payment entitlement gate. Every request is currently entitled; a payment
/// provider check would reject here before any model call is made.
pub async fn require_entitlement(_token: Option<&str>) -> Result<(), AppError> {
    Ok(())
}
