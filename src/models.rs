//! Modèle de données

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter, EnumString};
use uuid::Uuid;

use crate::utils::input_validation::{non_empty, Email, InvalidInput, Pesel, RatingScore};

/// Rôle d'un utilisateur: Patient, Médecin, Réception ou Administrateur
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[display("Patient")]
    Patient,
    #[display("Médecin")]
    Doctor,
    #[display("Réception")]
    Receptionist,
    #[display("Administrateur")]
    Administrator,
}

/// Un identifiant unique d'utilisateur.
#[derive(
    Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Display,
)]
pub struct UserID(String);

impl UserID {
    pub fn new() -> Self {
        Self(format!("usr{}", Uuid::new_v4().simple()))
    }
}

impl From<&str> for UserID {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for UserID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Un identifiant unique de visite
#[derive(
    Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Display,
)]
pub struct AppointmentID(String);

impl AppointmentID {
    pub fn new() -> Self {
        Self(format!("app{}", Uuid::new_v4().simple()))
    }
}

impl From<&str> for AppointmentID {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for AppointmentID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Un identifiant unique de document médical
#[derive(
    Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Display,
)]
pub struct DocumentID(Uuid);

impl DocumentID {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Les données communes à tous les comptes.
///
/// Un compte n'est jamais supprimé, seulement désactivé.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Display)]
#[display("{first_name} {last_name}")]
pub struct UserData {
    pub id: UserID,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub is_active: bool,
}

impl UserData {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .collect::<String>()
            .to_uppercase()
    }

    /// Recherche insensible à la casse sur le nom et l'email
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.first_name.to_lowercase().contains(&term)
            || self.last_name.to_lowercase().contains(&term)
            || self.email.as_ref().to_lowercase().contains(&term)
    }
}

/// Adresse postale d'un patient
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Un patient: un compte et ses données administratives
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Display)]
#[display("{user}")]
pub struct Patient {
    #[serde(flatten)]
    pub user: UserData,
    pub pesel: Option<Pesel>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<Address>,
}

/// Modification partielle d'un patient. Les champs absents sont conservés.
#[derive(Debug, Clone, Default)]
pub struct PatientPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub phone_number: Option<String>,
    pub pesel: Option<Pesel>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<Address>,
}

impl PatientPatch {
    pub fn apply_to(self, patient: &mut Patient) {
        if let Some(first_name) = self.first_name {
            patient.user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            patient.user.last_name = last_name;
        }
        if let Some(email) = self.email {
            patient.user.email = email;
        }
        if let Some(phone_number) = self.phone_number {
            patient.user.phone_number = Some(phone_number);
        }
        if let Some(pesel) = self.pesel {
            patient.pesel = Some(pesel);
        }
        if let Some(date_of_birth) = self.date_of_birth {
            patient.date_of_birth = Some(date_of_birth);
        }
        if let Some(address) = self.address {
            patient.address = Some(address);
        }
    }
}

/// Un médecin: un compte, une spécialisation et un numéro d'autorisation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Display)]
#[display("dr {user}")]
pub struct Doctor {
    #[serde(flatten)]
    pub user: UserData,
    pub specialization: String,
    pub license_number: String,
    pub about: Option<String>,
}

/// Statut d'une visite.
///
/// Progression à sens unique, sauf l'annulation, possible depuis
/// `Scheduled` ou `Confirmed` uniquement.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppointmentStatus {
    #[display("Planifiée")]
    Scheduled,
    #[display("Confirmée")]
    Confirmed,
    #[display("Annulée")]
    Canceled,
    #[display("Terminée")]
    Completed,
}

/// Évaluation d'une visite par le patient
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Rating {
    pub score: RatingScore,
    pub comment: Option<String>,
}

/// Une visite entre un patient et un médecin
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: AppointmentID,
    pub patient_id: UserID,
    pub doctor_id: UserID,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub kind: String,
    pub notes: Option<String>,
    pub rating: Option<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// Vrai si la visite commence strictement après `now`
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.starts_at() > now
    }

    /// Planifiée ou confirmée
    pub fn is_pending(&self) -> bool {
        matches!(self.status, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }

    pub fn is_canceled(&self) -> bool {
        self.status == AppointmentStatus::Canceled
    }

    /// Chevauchement avec l'intervalle `[start, end)` du même jour
    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.start_time < end && start < self.end_time
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} {} [{}]",
            self.date.format("%Y-%m-%d"),
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M"),
            self.kind,
            self.status
        )
    }
}

/// Les données d'une nouvelle visite, avant attribution d'un identifiant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDraft {
    pub patient_id: UserID,
    pub doctor_id: UserID,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub kind: String,
    pub notes: Option<String>,
}

/// Modification partielle d'une visite. Les champs absents sont conservés.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentPatch {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub status: Option<AppointmentStatus>,
    pub kind: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<Rating>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn rating(rating: Rating) -> Self {
        Self {
            rating: Some(rating),
            ..Self::default()
        }
    }

    pub fn apply_to(self, appointment: &mut Appointment) {
        if let Some(date) = self.date {
            appointment.date = date;
        }
        if let Some(start_time) = self.start_time {
            appointment.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            appointment.end_time = end_time;
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(kind) = self.kind {
            appointment.kind = kind;
        }
        if let Some(notes) = self.notes {
            appointment.notes = Some(notes);
        }
        if let Some(rating) = self.rating {
            appointment.rating = Some(rating);
        }
    }
}

/// L'utilisateur connecté. Son rôle est fixé pour toute la session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Display)]
#[display("{first_name} {last_name}")]
pub struct SessionUser {
    pub id: UserID,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<&UserData> for SessionUser {
    fn from(user: &UserData) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        }
    }
}

/// Un médicament prescrit
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

impl Medication {
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.dosage, &self.frequency, &self.duration]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[display("Normale")]
    Normal,
    #[display("Urgente")]
    Urgent,
}

/// Contenu d'un document rédigé par le médecin après une visite
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DocumentContent {
    MedicalNote {
        content: String,
    },
    Prescription {
        medications: Vec<Medication>,
        notes: Option<String>,
    },
    Referral {
        specialization: String,
        urgency: Urgency,
        reason: String,
        notes: Option<String>,
    },
}

impl DocumentContent {
    pub fn title(&self) -> &'static str {
        match self {
            DocumentContent::MedicalNote { .. } => "Note médicale",
            DocumentContent::Prescription { .. } => "Ordonnance",
            DocumentContent::Referral { .. } => "Orientation",
        }
    }

    /// Une ordonnance contient au moins un médicament, tous complets
    pub fn validate(&self) -> Result<(), InvalidInput> {
        match self {
            DocumentContent::MedicalNote { content } => {
                non_empty(content, "note")?;
            }
            DocumentContent::Prescription { medications, .. } => {
                if medications.is_empty() || !medications.iter().all(Medication::is_complete) {
                    return Err(InvalidInput("médicaments"));
                }
            }
            DocumentContent::Referral {
                specialization,
                reason,
                ..
            } => {
                non_empty(specialization, "spécialisation")?;
                non_empty(reason, "motif")?;
            }
        }
        Ok(())
    }
}

/// Un document médical rattaché à une visite
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClinicalDocument {
    pub id: DocumentID,
    pub appointment_id: AppointmentID,
    pub patient_id: UserID,
    pub doctor_id: UserID,
    pub date: NaiveDate,
    pub content: DocumentContent,
}

impl fmt::Display for ClinicalDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.content.title())
    }
}

/// Une plage horaire pour un jour de la semaine
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DayHours {
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Horaires de consultation d'un médecin
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DoctorSchedule {
    pub doctor_id: UserID,
    pub working_hours: Vec<DayHours>,
    pub slot_minutes: u32,
    pub gap_minutes: u32,
    pub breaks: Vec<DayHours>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn appointment(start: (u32, u32), end: (u32, u32)) -> Appointment {
        let created = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();
        Appointment {
            id: AppointmentID::from("app1"),
            patient_id: UserID::from("p1"),
            doctor_id: UserID::from("d1"),
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            status: AppointmentStatus::Scheduled,
            kind: "Konsultacja".to_owned(),
            notes: None,
            rating: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_role_round_trips_as_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Administrator).unwrap(), "\"administrator\"");
        assert_eq!(Role::from_str("receptionist").unwrap(), Role::Receptionist);
        assert_eq!(Role::Doctor.as_ref(), "doctor");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(AppointmentID::new(), AppointmentID::new());
        assert!(AppointmentID::new().as_ref().starts_with("app"));
        assert!(UserID::new().as_ref().starts_with("usr"));
    }

    #[test]
    fn test_overlap_is_half_open() {
        let visit = appointment((9, 0), (9, 30));
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();

        assert!(visit.overlaps(t(9, 15), t(9, 45)), "Partial overlap not detected");
        assert!(visit.overlaps(t(8, 0), t(10, 0)), "Enclosing interval not detected");
        assert!(!visit.overlaps(t(9, 30), t(10, 0)), "Adjacent slot reported as overlapping");
        assert!(!visit.overlaps(t(8, 30), t(9, 0)), "Adjacent slot reported as overlapping");
    }

    #[test]
    fn test_is_upcoming_compares_date_and_time() {
        let visit = appointment((9, 0), (9, 30));
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        assert!(visit.is_upcoming(day.and_hms_opt(8, 59, 0).unwrap()));
        assert!(!visit.is_upcoming(day.and_hms_opt(9, 0, 0).unwrap()));
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let mut visit = appointment((9, 0), (9, 30));
        let before = visit.clone();

        AppointmentPatch::status(AppointmentStatus::Confirmed).apply_to(&mut visit);

        assert_eq!(visit.status, AppointmentStatus::Confirmed);
        assert_eq!(Appointment { status: before.status, ..visit }, before);
    }

    #[test]
    fn test_medication_completeness() {
        let mut medication = Medication {
            name: "Ibuprofen".to_owned(),
            dosage: "200 mg".to_owned(),
            frequency: "3x dziennie".to_owned(),
            duration: "5 dni".to_owned(),
        };
        assert!(medication.is_complete());

        medication.frequency = "  ".to_owned();
        assert!(!medication.is_complete(), "Blank frequency accepted");
    }

    #[test]
    fn test_document_validation() {
        let medication = Medication {
            name: "Ibuprofen".to_owned(),
            dosage: "200 mg".to_owned(),
            frequency: "3x dziennie".to_owned(),
            duration: "5 dni".to_owned(),
        };
        let prescription = |medications| DocumentContent::Prescription { medications, notes: None };

        assert_eq!(prescription(vec![medication.clone()]).validate(), Ok(()));
        assert!(prescription(vec![]).validate().is_err(), "Empty prescription accepted");
        assert!(
            prescription(vec![medication.clone(), Medication { dosage: String::new(), ..medication }])
                .validate()
                .is_err(),
            "Incomplete medication accepted"
        );

        let note = DocumentContent::MedicalNote { content: " ".to_owned() };
        assert_eq!(note.validate(), Err(InvalidInput("note")));

        let referral = DocumentContent::Referral {
            specialization: "Neurologia".to_owned(),
            urgency: Urgency::Normal,
            reason: String::new(),
            notes: None,
        };
        assert_eq!(referral.validate(), Err(InvalidInput("motif")));
    }
}
