//! Constantes de l'application

/// Modèle et politique Casbin
pub const ACCESS_MODEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/access_control/model.conf");
pub const ACCESS_POLICY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/access_control/policy.csv");

pub const LOG_FILE: &str = "./medibook.log";

/// Latence simulée de la connexion
pub const LOGIN_DELAY_MS: u64 = 800;

/// Horaires par défaut d'un médecin, du lundi au vendredi
pub const OPENING_HOUR: u32 = 9;
pub const CLOSING_HOUR: u32 = 17;
pub const SLOT_MINUTES: u32 = 30;
pub const GAP_MINUTES: u32 = 5;

/// Nombre de visites affichées sur les tableaux de bord
pub const PATIENT_DASHBOARD_LIMIT: usize = 3;
pub const RECEPTION_DASHBOARD_LIMIT: usize = 6;
