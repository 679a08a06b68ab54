use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAction {
    Confirm,
    Cancel,
    Complete,
}

impl AppointmentAction {
    pub fn target(self) -> AppointmentStatus {
        match self {
            AppointmentAction::Confirm => AppointmentStatus::Confirmada,
            AppointmentAction::Cancel => AppointmentStatus::Cancelada,
            AppointmentAction::Complete => AppointmentStatus::Realizada,
        }
    }
}

/// Validate that a status transition is allowed and return the new status.
pub fn next_status(
    current: AppointmentStatus,
    action: AppointmentAction,
) -> Result<AppointmentStatus, AppointmentError> {
    let target = action.target();
    debug!("Validating status transition from {} to {}", current, target);

    if current.allowed_next().contains(&target) {
        Ok(target)
    } else {
        warn!("Invalid status transition attempted: {} -> {}", current, target);
        Err(AppointmentError::InvalidTransition {
            from: current,
            to: target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use AppointmentAction::*;
    use AppointmentStatus::*;

    #[test]
    fn pending_can_be_confirmed_or_cancelled() {
        assert_eq!(next_status(Pendiente, Confirm).unwrap(), Confirmada);
        assert_eq!(next_status(Pendiente, Cancel).unwrap(), Cancelada);
        assert_matches!(
            next_status(Pendiente, Complete),
            Err(AppointmentError::InvalidTransition { from: Pendiente, to: Realizada })
        );
    }

    #[test]
    fn confirmed_can_be_completed_or_cancelled() {
        assert_eq!(next_status(Confirmada, Complete).unwrap(), Realizada);
        assert_eq!(next_status(Confirmada, Cancel).unwrap(), Cancelada);
        assert!(next_status(Confirmada, Confirm).is_err());
    }

    #[test]
    fn finished_appointments_are_frozen() {
        for action in [Confirm, Cancel, Complete] {
            assert!(next_status(Cancelada, action).is_err());
            assert!(next_status(Realizada, action).is_err());
        }
    }
}
