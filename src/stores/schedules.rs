//! Horaires de consultation des médecins

use chrono::{NaiveTime, Weekday};
use log::info;

use crate::consts::{CLOSING_HOUR, GAP_MINUTES, OPENING_HOUR, SLOT_MINUTES};
use crate::models::{DayHours, DoctorSchedule, UserID};

const WORKING_DAYS: [Weekday; 5] = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];

impl DoctorSchedule {
    /// Du lundi au vendredi, de 9h à 17h, créneaux de 30 minutes
    /// séparés de 5 minutes
    pub fn standard(doctor_id: UserID) -> Self {
        let start = NaiveTime::from_hms_opt(OPENING_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
        let end = NaiveTime::from_hms_opt(CLOSING_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);

        Self {
            doctor_id,
            working_hours: WORKING_DAYS
                .iter()
                .map(|&weekday| DayHours { weekday, start, end })
                .collect(),
            slot_minutes: SLOT_MINUTES,
            gap_minutes: GAP_MINUTES,
            breaks: Vec::new(),
        }
    }

    pub fn hours_on(&self, weekday: Weekday) -> impl Iterator<Item = &DayHours> + '_ {
        self.working_hours.iter().filter(move |h| h.weekday == weekday)
    }

    pub fn breaks_on(&self, weekday: Weekday) -> impl Iterator<Item = &DayHours> + '_ {
        self.breaks.iter().filter(move |b| b.weekday == weekday)
    }
}

#[derive(Default)]
pub struct ScheduleStore {
    schedules: Vec<DoctorSchedule>,
}

impl ScheduleStore {
    pub fn new(schedules: Vec<DoctorSchedule>) -> Self {
        Self { schedules }
    }

    pub fn get(&self, doctor: &UserID) -> Option<&DoctorSchedule> {
        self.schedules.iter().find(|s| &s.doctor_id == doctor)
    }

    /// L'horaire enregistré, ou l'horaire standard si le médecin n'en a pas
    pub fn get_or_standard(&self, doctor: &UserID) -> DoctorSchedule {
        self.get(doctor)
            .cloned()
            .unwrap_or_else(|| DoctorSchedule::standard(doctor.clone()))
    }

    /// Remplace l'horaire du médecin concerné
    pub fn set(&mut self, schedule: DoctorSchedule) {
        info!("Horaire du médecin {} mis à jour", schedule.doctor_id);
        match self.schedules.iter_mut().find(|s| s.doctor_id == schedule.doctor_id) {
            Some(existing) => *existing = schedule,
            None => self.schedules.push(schedule),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_schedule() {
        let schedule = DoctorSchedule::standard(UserID::from("d1"));
        assert_eq!(schedule.working_hours.len(), 5);
        assert_eq!(schedule.hours_on(Weekday::Sat).count(), 0);
        assert_eq!(schedule.hours_on(Weekday::Mon).count(), 1);
        assert_eq!(schedule.slot_minutes, 30);
        assert_eq!(schedule.gap_minutes, 5);
    }

    #[test]
    fn test_set_replaces_existing() {
        let mut store = ScheduleStore::default();
        let doctor = UserID::from("d1");
        assert_eq!(store.get_or_standard(&doctor), DoctorSchedule::standard(doctor.clone()));

        let mut custom = DoctorSchedule::standard(doctor.clone());
        custom.slot_minutes = 45;
        store.set(custom.clone());
        custom.gap_minutes = 0;
        store.set(custom.clone());

        assert_eq!(store.get(&doctor), Some(&custom));
        assert_eq!(store.schedules.len(), 1);
    }
}
