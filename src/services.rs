//! API des pages, et point d'entrée unique pour le contrôle d'accès.
//!
//! Chaque opération vérifie la session, le rôle et l'appartenance avant de
//! toucher aux stores.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use log::info;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::authorization::{AccessDenied, Action, Context, Enforcer};
use crate::availability::{self, Slot};
use crate::dashboard::{self, Dashboard};
use crate::db::{Database, NewProfile, NewUser};
use crate::models::{
    Appointment, AppointmentDraft, AppointmentID, AppointmentPatch, AppointmentStatus,
    ClinicalDocument, Doctor, DoctorSchedule, DocumentContent, Patient, PatientPatch, Rating, Role,
    SessionUser, UserData, UserID,
};
use crate::reports::{self, DateRange, Report, ReportKind};
use crate::routing::{self, NavItem, Navigation};
use crate::stores::auth::LoginError;
use crate::stores::StoreError;
use crate::utils::input_validation::{non_empty, password_validation, InvalidInput, RatingScore};

pub struct Service {
    db: Database,
    enforcer: Enforcer,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error("Aucune session ouverte")]
    NotLoggedIn,

    #[error("{0} introuvable: {1}")]
    NotFound(&'static str, String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Cette visite a déjà commencé")]
    NotUpcoming,

    #[error("Action impossible pour une visite au statut {0}")]
    InvalidState(AppointmentStatus),

    #[error(transparent)]
    Validation(#[from] InvalidInput),
}

/// Filtre de la liste des visites
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub search: String,
    pub status: Option<AppointmentStatus>,
}

/// Une visite avec le médecin et le patient concernés
#[derive(Debug, Clone, Copy)]
pub struct AppointmentSummary<'a> {
    pub appointment: &'a Appointment,
    pub doctor: Option<&'a Doctor>,
    pub patient: Option<&'a Patient>,
}

impl AppointmentSummary<'_> {
    fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        let a = self.appointment;

        a.kind.to_lowercase().contains(&term)
            || a.date.format("%Y-%m-%d").to_string().contains(&term)
            || a.start_time.format("%H:%M").to_string().contains(&term)
            || self.doctor.is_some_and(|d| d.user.full_name().to_lowercase().contains(&term))
            || self.patient.is_some_and(|p| p.user.full_name().to_lowercase().contains(&term))
    }
}

impl fmt::Display for AppointmentSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.appointment)?;
        if let Some(doctor) = self.doctor {
            write!(f, " | {doctor}")?;
        }
        if let Some(patient) = self.patient {
            write!(f, " | {patient}")?;
        }
        Ok(())
    }
}

/// La page de détails d'une visite
#[derive(Debug, Clone)]
pub struct AppointmentDetails<'a> {
    pub summary: AppointmentSummary<'a>,
    pub documents: Vec<&'a ClinicalDocument>,
    pub actions: Vec<Action>,
}

/// Une demande de rendez-vous. Le patient est imposé lorsque c'est
/// lui qui réserve.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub patient_id: Option<UserID>,
    pub doctor_id: UserID,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub kind: String,
    pub notes: Option<String>,
}

/// La journée d'un médecin: visites réservées et créneaux
#[derive(Debug, Clone)]
pub struct DoctorDay<'a> {
    pub appointments: Vec<&'a Appointment>,
    pub slots: Vec<Slot>,
}

/// Filtre de la liste des comptes
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: String,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl Service {
    pub fn new(db: Database, enforcer: Enforcer) -> Self {
        Self { db, enforcer }
    }

    /// Ouvre une session si les identifiants sont valides
    pub fn login(&mut self, email: &str, password: &str) -> Result<SessionUser, LoginError> {
        self.db.auth.login(email, password)
    }

    /// Ferme la session
    pub fn logout(&mut self) {
        self.db.auth.logout()
    }

    pub fn session(&self) -> Option<&SessionUser> {
        self.db.auth.session()
    }

    pub fn today(&self) -> NaiveDate {
        self.db.clock().today()
    }

    fn subject(&self) -> Result<&SessionUser, ServiceError> {
        self.db.auth.session().ok_or(ServiceError::NotLoggedIn)
    }

    /// Crée un contexte d'autorisation ayant l'utilisateur connecté comme sujet
    fn enforce(&self) -> Result<Context<'_>, ServiceError> {
        Ok(self.enforcer.with_subject(self.subject()?))
    }

    pub fn navigate(&self, path: &str) -> Navigation {
        routing::resolve(path, self.session(), &self.enforcer)
    }

    /// Le menu de l'utilisateur connecté; vide sans session
    pub fn menu(&self) -> Vec<&'static NavItem> {
        self.enforce()
            .map(|ctx| routing::navigation_menu(&ctx))
            .unwrap_or_default()
    }

    pub fn dashboard(&self) -> Result<Dashboard, ServiceError> {
        Ok(dashboard::build(&self.db, self.subject()?))
    }

    fn summary<'a>(&'a self, appointment: &'a Appointment) -> AppointmentSummary<'a> {
        AppointmentSummary {
            appointment,
            doctor: self.db.doctors.get_by_id(&appointment.doctor_id),
            patient: self.db.patients.get_by_id(&appointment.patient_id),
        }
    }

    fn find_appointment(&self, id: &AppointmentID) -> Result<&Appointment, ServiceError> {
        self.db
            .appointments
            .get_by_id(id)
            .ok_or_else(|| ServiceError::NotFound("Visite", id.to_string()))
    }

    /// Les visites du patient, du médecin, ou toutes pour la réception,
    /// triées par date et heure
    pub fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentSummary<'_>>, ServiceError> {
        let ctx = self.enforce()?;
        ctx.appointment(Action::Read, None)?;

        let subject = ctx.subject();
        let visible: Vec<&Appointment> = match subject.role {
            Role::Patient => self.db.appointments.get_by_patient(&subject.id).collect(),
            Role::Doctor => self.db.appointments.get_by_doctor(&subject.id).collect(),
            _ => self.db.appointments.get_all().iter().collect(),
        };

        let mut summaries: Vec<_> = visible
            .into_iter()
            .filter(|a| filter.status.map_or(true, |status| a.status == status))
            .map(|a| self.summary(a))
            .filter(|s| s.matches(&filter.search))
            .collect();
        summaries.sort_by_key(|s| s.appointment.starts_at());
        Ok(summaries)
    }

    /// Vérifie que l'action est possible dans l'état actuel de la visite.
    /// Confirmer et annuler ne concernent que les visites à venir.
    fn check_state(&self, action: Action, appointment: &Appointment) -> Result<(), ServiceError> {
        use AppointmentStatus::*;

        let status = appointment.status;
        let upcoming = appointment.is_upcoming(self.db.clock().local_now());

        let allowed = match action {
            Action::Read | Action::Create => true,
            Action::Confirm => status == Scheduled,
            Action::Cancel => matches!(status, Scheduled | Confirmed),
            Action::Complete => matches!(status, Scheduled | Confirmed),
            Action::Rate => status == Completed && appointment.rating.is_none(),
            Action::Document => status == Completed,
        };
        if !allowed {
            return Err(ServiceError::InvalidState(status));
        }

        if matches!(action, Action::Confirm | Action::Cancel) && !upcoming {
            return Err(ServiceError::NotUpcoming);
        }
        Ok(())
    }

    /// Droit, appartenance, puis état de la visite
    fn authorize(&self, id: &AppointmentID, action: Action) -> Result<(), ServiceError> {
        let appointment = self.find_appointment(id)?;
        self.enforce()?.appointment(action, Some(appointment))?;
        self.check_state(action, appointment)
    }

    pub fn appointment(&self, id: &AppointmentID) -> Result<AppointmentDetails<'_>, ServiceError> {
        self.authorize(id, Action::Read)?;
        let appointment = self.find_appointment(id)?;

        let actions = Action::iter()
            .filter(|action| !matches!(action, Action::Read | Action::Create))
            .filter(|action| self.authorize(id, *action).is_ok())
            .collect();

        Ok(AppointmentDetails {
            summary: self.summary(appointment),
            documents: self.db.documents.for_appointment(id).collect(),
            actions,
        })
    }

    fn set_status(
        &mut self,
        id: &AppointmentID,
        action: Action,
        status: AppointmentStatus,
    ) -> Result<Appointment, ServiceError> {
        self.authorize(id, action)?;
        self.db
            .appointments
            .update(id, AppointmentPatch::status(status))?
            .ok_or_else(|| ServiceError::NotFound("Visite", id.to_string()))
    }

    pub fn confirm(&mut self, id: &AppointmentID) -> Result<Appointment, ServiceError> {
        self.set_status(id, Action::Confirm, AppointmentStatus::Confirmed)
    }

    pub fn cancel(&mut self, id: &AppointmentID) -> Result<Appointment, ServiceError> {
        self.authorize(id, Action::Cancel)?;
        self.db
            .appointments
            .cancel(id)?
            .ok_or_else(|| ServiceError::NotFound("Visite", id.to_string()))
    }

    pub fn complete(&mut self, id: &AppointmentID) -> Result<Appointment, ServiceError> {
        self.set_status(id, Action::Complete, AppointmentStatus::Completed)
    }

    pub fn rate(
        &mut self,
        id: &AppointmentID,
        score: RatingScore,
        comment: Option<String>,
    ) -> Result<Appointment, ServiceError> {
        self.authorize(id, Action::Rate)?;

        let comment = comment.filter(|c| !c.trim().is_empty());
        self.db
            .appointments
            .update(id, AppointmentPatch::rating(Rating { score, comment }))?
            .ok_or_else(|| ServiceError::NotFound("Visite", id.to_string()))
    }

    /// Note médicale, ordonnance ou orientation sur une visite terminée
    pub fn add_document(
        &mut self,
        id: &AppointmentID,
        content: DocumentContent,
    ) -> Result<ClinicalDocument, ServiceError> {
        self.authorize(id, Action::Document)?;
        content.validate()?;

        let appointment = self.find_appointment(id)?.clone();
        let today = self.today();
        Ok(self.db.documents.add(&appointment, content, today))
    }

    pub fn doctors(&self) -> Vec<&Doctor> {
        self.db.doctors.get_all().collect()
    }

    pub fn search_doctors<'a>(&'a self, term: &str) -> Vec<&'a Doctor> {
        self.db.doctors.search(term).collect()
    }

    pub fn specializations(&self) -> Vec<&str> {
        self.db.doctors.specializations().into_iter().collect()
    }

    pub fn doctors_by_specialization<'a>(&'a self, specialization: &str) -> Vec<&'a Doctor> {
        self.db.doctors.get_by_specialization(specialization).collect()
    }

    fn find_doctor(&self, id: &UserID) -> Result<&Doctor, ServiceError> {
        self.db
            .doctors
            .get_by_id(id)
            .filter(|doctor| doctor.user.is_active)
            .ok_or_else(|| ServiceError::NotFound("Médecin", id.to_string()))
    }

    /// Les créneaux libres d'un médecin. Rien pour une date passée, et
    /// seulement les créneaux à venir pour aujourd'hui.
    pub fn available_slots(&self, doctor: &UserID, date: NaiveDate) -> Result<Vec<Slot>, ServiceError> {
        self.subject()?;
        self.find_doctor(doctor)?;

        let now = self.db.clock().local_now();
        if date < now.date() {
            return Ok(Vec::new());
        }

        let schedule = self.db.schedules.get_or_standard(doctor);
        Ok(
            availability::available_slots(&schedule, date, self.db.appointments.get_by_doctor(doctor))
                .into_iter()
                .filter(|slot| date.and_time(slot.start) > now)
                .collect(),
        )
    }

    /// Réserve un créneau libre. La fin de la visite est calculée à partir
    /// de la durée des consultations du médecin.
    pub fn book_appointment(&mut self, request: BookingRequest) -> Result<Appointment, ServiceError> {
        let ctx = self.enforce()?;
        ctx.appointment(Action::Create, None)?;

        let subject = ctx.subject();
        let patient_id = match (subject.role, request.patient_id) {
            (Role::Patient, _) => subject.id.clone(),
            (_, Some(patient)) => patient,
            (_, None) => return Err(InvalidInput("patient").into()),
        };
        self.db
            .patients
            .get_by_id(&patient_id)
            .ok_or_else(|| ServiceError::NotFound("Patient", patient_id.to_string()))?;

        let kind = non_empty(&request.kind, "type")?;
        if request.date < self.today() {
            return Err(InvalidInput("date").into());
        }

        let slot = self
            .available_slots(&request.doctor_id, request.date)?
            .into_iter()
            .find(|slot| slot.start == request.start_time)
            .ok_or(InvalidInput("créneau"))?;

        let appointment = self.db.appointments.create(AppointmentDraft {
            patient_id,
            doctor_id: request.doctor_id,
            date: request.date,
            start_time: slot.start,
            end_time: slot.end,
            status: AppointmentStatus::Scheduled,
            kind,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
        });
        Ok(appointment)
    }

    pub fn schedule(&self, doctor: &UserID) -> Result<DoctorSchedule, ServiceError> {
        self.enforce()?.read_schedule(doctor)?;
        self.find_doctor(doctor)?;
        Ok(self.db.schedules.get_or_standard(doctor))
    }

    pub fn update_schedule(&mut self, schedule: DoctorSchedule) -> Result<(), ServiceError> {
        self.enforce()?.update_schedule(&schedule.doctor_id)?;

        let valid_ranges = schedule
            .working_hours
            .iter()
            .chain(schedule.breaks.iter())
            .all(|hours| hours.start < hours.end);
        if schedule.slot_minutes == 0 || !valid_ranges {
            return Err(InvalidInput("horaires").into());
        }

        self.db.schedules.set(schedule);
        Ok(())
    }

    /// Visites réservées et créneaux d'un médecin pour une journée
    pub fn doctor_day(&self, doctor: &UserID, date: NaiveDate) -> Result<DoctorDay<'_>, ServiceError> {
        let schedule = self.schedule(doctor)?;

        let mut appointments: Vec<&Appointment> = self
            .db
            .appointments
            .get_by_doctor(doctor)
            .filter(|a| a.date == date && !a.is_canceled())
            .collect();
        appointments.sort_by_key(|a| a.start_time);

        Ok(DoctorDay {
            slots: availability::day_slots(&schedule, date, appointments.iter().copied()),
            appointments,
        })
    }

    pub fn patients<'a>(&'a self, term: &str) -> Result<Vec<&'a Patient>, ServiceError> {
        self.enforce()?.read_patients()?;
        Ok(self.db.patients.search(term).collect())
    }

    /// Une fiche patient: la sienne, ou n'importe laquelle pour le personnel
    pub fn patient(&self, id: &UserID) -> Result<&Patient, ServiceError> {
        let ctx = self.enforce()?;
        ctx.read_patients().or_else(|_| ctx.update_patient(id))?;

        self.db
            .patients
            .get_by_id(id)
            .ok_or_else(|| ServiceError::NotFound("Patient", id.to_string()))
    }

    pub fn update_patient(&mut self, id: &UserID, patch: PatientPatch) -> Result<Patient, ServiceError> {
        self.enforce()?.update_patient(id)?;
        if let Some(first_name) = &patch.first_name {
            non_empty(first_name, "prénom")?;
        }
        if let Some(last_name) = &patch.last_name {
            non_empty(last_name, "nom")?;
        }

        let patient = self
            .db
            .update_patient(id, patch)?
            .ok_or_else(|| ServiceError::NotFound("Patient", id.to_string()))?;
        info!("Fiche patient {} mise à jour", patient.user.id);
        Ok(patient)
    }

    pub fn users(&self, filter: &UserFilter) -> Result<Vec<&UserData>, ServiceError> {
        self.enforce()?.manage_users()?;

        Ok(self
            .db
            .auth
            .users()
            .filter(|u| filter.role.map_or(true, |role| u.role == role))
            .filter(|u| filter.active.map_or(true, |active| u.is_active == active))
            .filter(|u| u.matches(filter.search.trim()))
            .collect())
    }

    /// Un administrateur ne peut pas désactiver son propre compte
    pub fn set_user_active(&mut self, id: &UserID, active: bool) -> Result<UserData, ServiceError> {
        let ctx = self.enforce()?;
        ctx.manage_users()?;
        if !active && &ctx.subject().id == id {
            return Err(InvalidInput("compte").into());
        }

        self.db
            .set_user_active(id, active)
            .ok_or_else(|| ServiceError::NotFound("Compte", id.to_string()))
    }

    pub fn create_user(&mut self, new_user: NewUser) -> Result<UserData, ServiceError> {
        self.enforce()?.manage_users()?;

        non_empty(&new_user.first_name, "prénom")?;
        non_empty(&new_user.last_name, "nom")?;
        if let NewProfile::Doctor {
            specialization,
            license_number,
        } = &new_user.profile
        {
            non_empty(specialization, "spécialisation")?;
            non_empty(license_number, "numéro d'autorisation")?;
        }
        if !password_validation(&new_user.password, new_user.email.as_ref()) {
            return Err(InvalidInput("mot de passe").into());
        }

        Ok(self.db.create_user(new_user)?)
    }

    pub fn report(&self, kind: ReportKind, range: DateRange) -> Result<Report, ServiceError> {
        self.enforce()?.view_reports()?;
        Ok(reports::generate(&self.db, kind, range))
    }
}
