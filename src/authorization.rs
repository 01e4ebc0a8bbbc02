//! Wrapper d'appel à Casbin pour la table des rôles, complété par les
//! vérifications d'appartenance (un patient n'agit que sur ses visites,
//! un médecin que sur celles qui lui sont attribuées)

use casbin::CoreApi;
use derive_more::Display;
use log::{error, info};
use serde_json::json;
use strum_macros::{AsRefStr, EnumIter};
use thiserror::Error;

use crate::consts::{ACCESS_MODEL, ACCESS_POLICY};
use crate::models::{Appointment, Role, SessionUser, UserID};
use crate::routing::Route;

const APPOINTMENT: &str = "appointment";
const PATIENT: &str = "patient";
const SCHEDULE: &str = "schedule";
const USER: &str = "user";
const REPORT: &str = "report";

/// Un enforcer Casbin
pub struct Enforcer(casbin::Enforcer);

type CasbinResult = Result<(), AccessDenied>;

/// Une erreur sans détails en cas d'accès refusé
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Accès refusé.")]
pub struct AccessDenied;

/// Les actions sur une visite
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, AsRefStr, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Action {
    #[display("Consulter")]
    Read,
    #[display("Réserver")]
    Create,
    #[display("Confirmer")]
    Confirm,
    #[display("Annuler")]
    Cancel,
    #[display("Terminer")]
    Complete,
    #[display("Évaluer")]
    Rate,
    #[display("Rédiger un document")]
    Document,
}

/// Un contexte contenant une référence à un enforcer et à un sujet.
pub struct Context<'ctx> {
    enforcer: &'ctx Enforcer,
    subject: &'ctx SessionUser,
}

impl Enforcer {
    pub fn load() -> Result<Self, casbin::Error> {
        let mut enforcer =
            futures::executor::block_on(casbin::Enforcer::new(ACCESS_MODEL, ACCESS_POLICY))?;
        futures::executor::block_on(enforcer.load_policy())?;
        Ok(Enforcer(enforcer))
    }

    pub fn with_subject<'ctx>(&'ctx self, subject: &'ctx SessionUser) -> Context<'ctx> {
        Context {
            enforcer: self,
            subject,
        }
    }
}

impl<'ctx> Context<'ctx> {
    fn enforce(&self, object: &str, action: &str) -> CasbinResult {
        let subject = self.subject;

        info!(
            "Enforcing {}",
            json!({ "sub": subject, "obj": object, "act": action })
        );

        match self.enforcer.0.enforce((subject, object, action)) {
            Err(e) => {
                error!("Casbin error: {e:?}");
                Err(AccessDenied)
            }
            Ok(r) => {
                info!("Granted: {r}");
                if r {
                    Ok(())
                } else {
                    Err(AccessDenied)
                }
            }
        }
    }

    pub fn subject(&self) -> &'ctx SessionUser {
        self.subject
    }

    /// Le rôle peut-il afficher cette page ?
    pub fn view(&self, route: &Route) -> CasbinResult {
        self.enforce(route.pattern(), "view")
    }

    /// L'action est permise au rôle, et la visite, si elle est donnée,
    /// appartient au sujet lorsqu'il est patient ou médecin
    pub fn appointment(&self, action: Action, appointment: Option<&Appointment>) -> CasbinResult {
        self.enforce(APPOINTMENT, action.as_ref())?;

        let Some(appointment) = appointment else {
            return Ok(());
        };
        match self.subject.role {
            Role::Patient => self.owns(&appointment.patient_id),
            Role::Doctor => self.owns(&appointment.doctor_id),
            Role::Receptionist | Role::Administrator => Ok(()),
        }
    }

    pub fn read_patients(&self) -> CasbinResult {
        self.enforce(PATIENT, "read")
    }

    /// Un patient ne modifie que sa propre fiche
    pub fn update_patient(&self, patient: &UserID) -> CasbinResult {
        self.enforce(PATIENT, "update")?;
        match self.subject.role {
            Role::Patient => self.owns(patient),
            _ => Ok(()),
        }
    }

    /// Un médecin ne consulte que son propre horaire
    pub fn read_schedule(&self, doctor: &UserID) -> CasbinResult {
        self.enforce(SCHEDULE, "read")?;
        match self.subject.role {
            Role::Doctor => self.owns(doctor),
            _ => Ok(()),
        }
    }

    pub fn update_schedule(&self, doctor: &UserID) -> CasbinResult {
        self.enforce(SCHEDULE, "update")?;
        self.owns(doctor)
    }

    pub fn manage_users(&self) -> CasbinResult {
        self.enforce(USER, "manage")
    }

    pub fn view_reports(&self) -> CasbinResult {
        self.enforce(REPORT, "view")
    }

    fn owns(&self, owner: &UserID) -> CasbinResult {
        if &self.subject.id == owner {
            Ok(())
        } else {
            info!("Refusé: {} n'est pas {owner}", self.subject.id);
            Err(AccessDenied)
        }
    }
}
