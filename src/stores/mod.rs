//! Stores en mémoire: une collection et ses opérations de lecture,
//! de filtrage et de mise à jour, toutes synchrones

pub mod appointments;
pub mod auth;
pub mod doctors;
pub mod documents;
pub mod patients;
pub mod schedules;

use thiserror::Error;

use crate::models::AppointmentStatus;
use crate::utils::input_validation::{Email, InvalidInput};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Transition de statut interdite: {from} -> {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Un compte existe déjà pour {0}")]
    DuplicateEmail(Email),

    #[error("Impossible de hacher le mot de passe")]
    PasswordHash,

    #[error(transparent)]
    Invalid(#[from] InvalidInput),
}
