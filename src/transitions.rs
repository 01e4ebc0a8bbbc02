//! Table des transitions de statut d'une visite

use derive_more::Display;
use log::warn;
use strum_macros::EnumString;

use crate::models::AppointmentStatus::{self, Canceled, Completed, Confirmed, Scheduled};
use crate::stores::StoreError;

/// Le store refuse-t-il les transitions absentes de la table ?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TransitionPolicy {
    /// Une transition illégale est une erreur
    #[default]
    #[display("strict")]
    Strict,
    /// Tout changement de statut est accepté, avec un avertissement dans le journal
    #[display("permissive")]
    Permissive,
}

/// Statuts atteignables depuis `current`
pub fn allowed_next(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        Scheduled => &[Confirmed, Canceled, Completed],
        Confirmed => &[Canceled, Completed],
        Completed | Canceled => &[],
    }
}

/// Rester dans le même statut est toujours permis
pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    from == to || allowed_next(from).contains(&to)
}

impl TransitionPolicy {
    pub fn check(&self, from: AppointmentStatus, to: AppointmentStatus) -> Result<(), StoreError> {
        if can_transition(from, to) {
            return Ok(());
        }

        match self {
            TransitionPolicy::Strict => Err(StoreError::IllegalTransition { from, to }),
            TransitionPolicy::Permissive => {
                warn!("Transition hors table acceptée: {from:?} -> {to:?}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_terminal_states() {
        for status in [Completed, Canceled] {
            assert!(allowed_next(status).is_empty(), "{status:?} should be terminal");
            for next in AppointmentStatus::iter().filter(|s| *s != status) {
                assert!(!can_transition(status, next),
                        "Transition {status:?} -> {next:?} should not be allowed");
            }
        }
    }

    #[test]
    fn test_cancellation_only_before_completion() {
        assert!(can_transition(Scheduled, Canceled));
        assert!(can_transition(Confirmed, Canceled));
        assert!(!can_transition(Completed, Canceled));
    }

    #[test]
    fn test_no_way_back_to_scheduled() {
        for status in [Confirmed, Completed, Canceled] {
            assert!(!can_transition(status, Scheduled),
                    "{status:?} -> Scheduled should not be allowed");
        }
    }

    #[test]
    fn test_policy_enforcement() {
        assert_eq!(
            TransitionPolicy::Strict.check(Completed, Scheduled),
            Err(StoreError::IllegalTransition { from: Completed, to: Scheduled })
        );
        assert_eq!(TransitionPolicy::Permissive.check(Completed, Scheduled), Ok(()));
        assert_eq!(TransitionPolicy::Strict.check(Scheduled, Confirmed), Ok(()));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(TransitionPolicy::from_str("strict"), Ok(TransitionPolicy::Strict));
        assert_eq!(TransitionPolicy::from_str("permissive"), Ok(TransitionPolicy::Permissive));
        assert!(TransitionPolicy::from_str("lenient").is_err());
    }
}
