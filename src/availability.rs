//! Calcul des créneaux d'un médecin pour une journée.
//!
//! Les créneaux commencent à l'ouverture et avancent de la durée d'une
//! consultation plus la pause entre deux consultations. Un créneau doit
//! se terminer au plus tard à la fermeture. Il est occupé s'il chevauche
//! une pause ou une visite non annulée du médecin ce jour-là.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

use crate::models::{Appointment, DoctorSchedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub available: bool,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Tous les créneaux de la journée, libres ou non, triés par heure
pub fn day_slots<'a>(
    schedule: &DoctorSchedule,
    date: NaiveDate,
    appointments: impl IntoIterator<Item = &'a Appointment>,
) -> Vec<Slot> {
    let weekday = date.weekday();
    let booked: Vec<&Appointment> = appointments
        .into_iter()
        .filter(|a| a.doctor_id == schedule.doctor_id && a.date == date && !a.is_canceled())
        .collect();

    let mut slots = Vec::new();
    if schedule.slot_minutes == 0 {
        return slots;
    }

    let length = Duration::minutes(i64::from(schedule.slot_minutes));
    let step = length + Duration::minutes(i64::from(schedule.gap_minutes));

    for hours in schedule.hours_on(weekday) {
        let mut start = hours.start;
        loop {
            // Un créneau qui passerait minuit n'existe pas
            let (end, wrapped) = start.overflowing_add_signed(length);
            if wrapped != 0 || end > hours.end {
                break;
            }

            let blocked = schedule
                .breaks_on(weekday)
                .any(|pause| pause.start < end && start < pause.end)
                || booked.iter().any(|a| a.overlaps(start, end));

            slots.push(Slot {
                start,
                end,
                available: !blocked,
            });

            let (next, wrapped) = start.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            start = next;
        }
    }

    slots.sort_by_key(|slot| slot.start);
    slots
}

/// Les créneaux libres uniquement
pub fn available_slots<'a>(
    schedule: &DoctorSchedule,
    date: NaiveDate,
    appointments: impl IntoIterator<Item = &'a Appointment>,
) -> Vec<Slot> {
    day_slots(schedule, date, appointments)
        .into_iter()
        .filter(|slot| slot.available)
        .collect()
}
