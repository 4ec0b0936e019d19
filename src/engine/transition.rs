use crate::error::AppError;
use crate::models::status::OrderStatus;

const SKIPS_IN_PROGRESS: &str = "work must be IN_PROGRESS before it can be COMPLETED";
const REGRESSION: &str = "work that has started cannot return to PENDING";
const COMPLETED_IS_TERMINAL: &str = "COMPLETED is a terminal status";
const CANCELLED_IS_TERMINAL: &str = "CANCELLED is a terminal status";

/// Checks a status change against the lifecycle shared by orders and items.
/// `from` must be the persisted status, never a previously proposed one.
pub fn check_transition(scope: &str, from: OrderStatus, to: OrderStatus) -> Result<(), AppError> {
    use OrderStatus::*;

    if from == to {
        return Ok(());
    }

    let reason = match (from, to) {
        (Completed, _) => COMPLETED_IS_TERMINAL,
        (Cancelled, _) => CANCELLED_IS_TERMINAL,
        (Pending, Completed) => SKIPS_IN_PROGRESS,
        (InProgress, Pending) => REGRESSION,
        (Pending, _) | (InProgress, _) => return Ok(()),
    };

    Err(AppError::InvalidTransition {
        scope: scope.to_string(),
        from,
        to,
        reason,
    })
}
