//! Rapports et statistiques de l'administrateur, calculés à la demande

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use derive_more::Display;
use strum_macros::EnumIter;

use crate::db::Database;
use crate::models::{Appointment, AppointmentStatus, UserID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum ReportKind {
    #[display("Rapport des visites")]
    Appointments,
    #[display("Rapport des médecins")]
    Doctors,
    #[display("Rapport des patients")]
    Patients,
    #[display("Statistiques générales")]
    Statistics,
}

impl ReportKind {
    pub fn description(&self) -> &'static str {
        match self {
            ReportKind::Appointments => "Toutes les visites de la période, par statut",
            ReportKind::Doctors => "Activité et évaluations des médecins",
            ReportKind::Patients => "Activité des patients",
            ReportKind::Statistics => "Statistiques générales du système",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, Display)]
pub enum DateRange {
    #[display("Aujourd'hui")]
    Today,
    #[display("7 derniers jours")]
    Last7Days,
    #[default]
    #[display("30 derniers jours")]
    Last30Days,
    #[display("Ce mois-ci")]
    ThisMonth,
    #[display("Cette année")]
    ThisYear,
    #[display("Depuis toujours")]
    AllTime,
}

impl DateRange {
    /// Les périodes glissantes incluent aujourd'hui et s'arrêtent à aujourd'hui
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let within_last = |days: u64| {
            let first = today.checked_sub_days(Days::new(days - 1)).unwrap_or(NaiveDate::MIN);
            first <= date && date <= today
        };

        match self {
            DateRange::Today => date == today,
            DateRange::Last7Days => within_last(7),
            DateRange::Last30Days => within_last(30),
            DateRange::ThisMonth => date.year() == today.year() && date.month() == today.month(),
            DateRange::ThisYear => date.year() == today.year(),
            DateRange::AllTime => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub scheduled: usize,
    pub confirmed: usize,
    pub canceled: usize,
    pub completed: usize,
}

impl StatusBreakdown {
    fn record(&mut self, status: AppointmentStatus) {
        match status {
            AppointmentStatus::Scheduled => self.scheduled += 1,
            AppointmentStatus::Confirmed => self.confirmed += 1,
            AppointmentStatus::Canceled => self.canceled += 1,
            AppointmentStatus::Completed => self.completed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.scheduled + self.confirmed + self.canceled + self.completed
    }
}

impl<'a> FromIterator<&'a Appointment> for StatusBreakdown {
    fn from_iter<I: IntoIterator<Item = &'a Appointment>>(iter: I) -> Self {
        let mut breakdown = Self::default();
        for appointment in iter {
            breakdown.record(appointment.status);
        }
        breakdown
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoctorReport {
    pub doctor_id: UserID,
    pub name: String,
    pub specialization: String,
    pub visits: StatusBreakdown,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientReport {
    pub patient_id: UserID,
    pub name: String,
    pub visits: usize,
    pub last_visit: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub visits: StatusBreakdown,
    pub distinct_patients: usize,
    pub distinct_doctors: usize,
    pub active_accounts: usize,
    pub total_accounts: usize,
    pub documents: usize,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Appointments(StatusBreakdown),
    Doctors(Vec<DoctorReport>),
    Patients(Vec<PatientReport>),
    Statistics(Statistics),
}

fn average_rating<'a>(appointments: impl Iterator<Item = &'a Appointment>) -> Option<f64> {
    let scores: Vec<f64> = appointments
        .filter_map(|a| a.rating.as_ref())
        .map(|rating| f64::from(rating.score.value()))
        .collect();

    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

pub fn generate(db: &Database, kind: ReportKind, range: DateRange) -> Report {
    let today = db.clock().today();
    let in_range: Vec<&Appointment> = db
        .appointments
        .get_all()
        .iter()
        .filter(|a| range.contains(a.date, today))
        .collect();

    match kind {
        ReportKind::Appointments => Report::Appointments(in_range.iter().copied().collect()),

        ReportKind::Doctors => Report::Doctors(
            db.doctors
                .get_all()
                .map(|doctor| {
                    let own: Vec<&Appointment> = in_range
                        .iter()
                        .copied()
                        .filter(|a| a.doctor_id == doctor.user.id)
                        .collect();
                    DoctorReport {
                        doctor_id: doctor.user.id.clone(),
                        name: doctor.user.full_name(),
                        specialization: doctor.specialization.clone(),
                        visits: own.iter().copied().collect(),
                        average_rating: average_rating(own.into_iter()),
                    }
                })
                .collect(),
        ),

        ReportKind::Patients => Report::Patients(
            db.patients
                .get_all()
                .iter()
                .map(|patient| {
                    let own: Vec<&Appointment> = in_range
                        .iter()
                        .copied()
                        .filter(|a| a.patient_id == patient.user.id)
                        .collect();
                    PatientReport {
                        patient_id: patient.user.id.clone(),
                        name: patient.user.full_name(),
                        visits: own.len(),
                        last_visit: own
                            .iter()
                            .filter(|a| a.status == AppointmentStatus::Completed)
                            .map(|a| a.date)
                            .max(),
                    }
                })
                .collect(),
        ),

        ReportKind::Statistics => Report::Statistics(Statistics {
            visits: in_range.iter().copied().collect(),
            distinct_patients: in_range.iter().map(|a| &a.patient_id).collect::<BTreeSet<_>>().len(),
            distinct_doctors: in_range.iter().map(|a| &a.doctor_id).collect::<BTreeSet<_>>().len(),
            active_accounts: db.auth.users().filter(|u| u.is_active).count(),
            total_accounts: db.auth.users().count(),
            documents: db.documents.len(),
            average_rating: average_rating(in_range.iter().copied()),
        }),
    }
}

fn rating(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| format!("{v:.1}/5"))
}

impl fmt::Display for StatusBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} visites: {} planifiées, {} confirmées, {} terminées, {} annulées",
            self.total(),
            self.scheduled,
            self.confirmed,
            self.completed,
            self.canceled
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Appointments(visits) => writeln!(f, "{visits}"),
            Report::Doctors(doctors) => {
                for doctor in doctors {
                    writeln!(
                        f,
                        "dr {} ({}): {}, note moyenne {}",
                        doctor.name,
                        doctor.specialization,
                        doctor.visits,
                        rating(doctor.average_rating)
                    )?;
                }
                Ok(())
            }
            Report::Patients(patients) => {
                for patient in patients {
                    let last = patient
                        .last_visit
                        .map_or_else(|| "-".to_owned(), |d| d.format("%Y-%m-%d").to_string());
                    writeln!(f, "{}: {} visites, dernière visite {last}", patient.name, patient.visits)?;
                }
                Ok(())
            }
            Report::Statistics(stats) => {
                writeln!(f, "{}", stats.visits)?;
                writeln!(f, "Patients distincts: {}", stats.distinct_patients)?;
                writeln!(f, "Médecins distincts: {}", stats.distinct_doctors)?;
                writeln!(f, "Comptes actifs: {}/{}", stats.active_accounts, stats.total_accounts)?;
                writeln!(f, "Documents médicaux: {}", stats.documents)?;
                writeln!(f, "Note moyenne: {}", rating(stats.average_rating))
            }
        }
    }
}
