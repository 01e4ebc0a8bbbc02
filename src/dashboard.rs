//! Tableau de bord, selon le rôle de l'utilisateur connecté

use std::collections::BTreeSet;

use strum::IntoEnumIterator;

use crate::consts::{PATIENT_DASHBOARD_LIMIT, RECEPTION_DASHBOARD_LIMIT};
use crate::db::Database;
use crate::models::{Appointment, Role, SessionUser};
use crate::reports::ReportKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dashboard {
    Patient {
        upcoming: Vec<Appointment>,
    },
    Doctor {
        today: Vec<Appointment>,
        upcoming_count: usize,
        patient_count: usize,
    },
    Receptionist {
        today: Vec<Appointment>,
        today_count: usize,
        upcoming_count: usize,
        active_doctors: usize,
    },
    Administrator {
        active_accounts: usize,
        total_accounts: usize,
        report_count: usize,
    },
}

fn sorted(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by_key(Appointment::starts_at);
    appointments
}

pub fn build(db: &Database, user: &SessionUser) -> Dashboard {
    let now = db.clock().local_now();
    let today = now.date();
    let is_upcoming = |a: &&Appointment| a.is_pending() && a.is_upcoming(now);
    let is_today = |a: &&Appointment| !a.is_canceled() && a.date == today;

    match user.role {
        Role::Patient => {
            let upcoming = db
                .appointments
                .get_by_patient(&user.id)
                .filter(is_upcoming)
                .cloned()
                .collect();
            let mut upcoming = sorted(upcoming);
            upcoming.truncate(PATIENT_DASHBOARD_LIMIT);
            Dashboard::Patient { upcoming }
        }

        Role::Doctor => {
            let own = || db.appointments.get_by_doctor(&user.id);
            Dashboard::Doctor {
                today: sorted(own().filter(is_today).cloned().collect()),
                upcoming_count: own().filter(is_upcoming).count(),
                patient_count: own().map(|a| &a.patient_id).collect::<BTreeSet<_>>().len(),
            }
        }

        Role::Receptionist => {
            let all = db.appointments.get_all();
            let mut today = sorted(all.iter().filter(is_today).cloned().collect());
            let today_count = today.len();
            today.truncate(RECEPTION_DASHBOARD_LIMIT);
            Dashboard::Receptionist {
                today,
                today_count,
                upcoming_count: all.iter().filter(is_upcoming).count(),
                active_doctors: db.doctors.get_all().count(),
            }
        }

        Role::Administrator => Dashboard::Administrator {
            active_accounts: db.auth.users().filter(|u| u.is_active).count(),
            total_accounts: db.auth.users().count(),
            report_count: ReportKind::iter().count(),
        },
    }
}
