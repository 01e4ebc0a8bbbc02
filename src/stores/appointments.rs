//! Les visites

use std::rc::Rc;

use chrono::Duration;
use log::info;

use crate::models::{
    Appointment, AppointmentDraft, AppointmentID, AppointmentPatch, AppointmentStatus, UserID,
};
use crate::stores::StoreError;
use crate::transitions::TransitionPolicy;
use crate::utils::clock::Clock;

pub struct AppointmentStore {
    appointments: Vec<Appointment>,
    policy: TransitionPolicy,
    clock: Rc<dyn Clock>,
}

impl AppointmentStore {
    pub fn new(appointments: Vec<Appointment>, policy: TransitionPolicy, clock: Rc<dyn Clock>) -> Self {
        Self {
            appointments,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Toutes les visites, dans l'ordre de la collection
    pub fn get_all(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn get_by_patient<'a>(&'a self, patient: &UserID) -> impl Iterator<Item = &'a Appointment> + 'a {
        let patient = patient.clone();
        self.appointments
            .iter()
            .filter(move |appointment| appointment.patient_id == patient)
    }

    pub fn get_by_doctor<'a>(&'a self, doctor: &UserID) -> impl Iterator<Item = &'a Appointment> + 'a {
        let doctor = doctor.clone();
        self.appointments
            .iter()
            .filter(move |appointment| appointment.doctor_id == doctor)
    }

    pub fn get_by_id(&self, id: &AppointmentID) -> Option<&Appointment> {
        self.appointments.iter().find(|appointment| &appointment.id == id)
    }

    /// Ajoute une visite. Aucune vérification de chevauchement, de
    /// disponibilité du médecin ni d'existence du patient.
    pub fn create(&mut self, draft: AppointmentDraft) -> Appointment {
        let now = self.clock.now();
        let AppointmentDraft {
            patient_id,
            doctor_id,
            date,
            start_time,
            end_time,
            status,
            kind,
            notes,
        } = draft;

        let appointment = Appointment {
            id: AppointmentID::new(),
            patient_id,
            doctor_id,
            date,
            start_time,
            end_time,
            status,
            kind,
            notes,
            rating: None,
            created_at: now,
            updated_at: now,
        };

        info!(
            "Visite {} créée: patient {}, médecin {}, {}",
            appointment.id, appointment.patient_id, appointment.doctor_id, appointment
        );
        self.appointments.push(appointment.clone());
        appointment
    }

    /// Fusionne `patch` dans la visite et rafraîchit `updated_at`.
    ///
    /// `Ok(None)` si la visite n'existe pas. Un changement de statut est
    /// vérifié selon la politique de transition du store.
    pub fn update(
        &mut self,
        id: &AppointmentID,
        patch: AppointmentPatch,
    ) -> Result<Option<Appointment>, StoreError> {
        let now = self.clock.now();
        let policy = self.policy;

        let Some(appointment) = self.appointments.iter_mut().find(|a| &a.id == id) else {
            return Ok(None);
        };

        if let Some(next) = patch.status {
            policy.check(appointment.status, next)?;
            if next != appointment.status {
                info!("Visite {id}: {:?} -> {next:?}", appointment.status);
            }
        }

        patch.apply_to(appointment);

        // updated_at reste strictement croissant même si l'horloge n'a pas avancé
        appointment.updated_at = now.max(appointment.updated_at + Duration::microseconds(1));

        Ok(Some(appointment.clone()))
    }

    pub fn cancel(&mut self, id: &AppointmentID) -> Result<Option<Appointment>, StoreError> {
        self.update(id, AppointmentPatch::status(AppointmentStatus::Canceled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rating, UserID};
    use crate::utils::clock::FixedClock;
    use crate::utils::input_validation::RatingScore;
    use chrono::{NaiveDate, NaiveTime};
    use crate::models::AppointmentStatus::*;

    fn clock() -> Rc<FixedClock> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Rc::new(FixedClock::new(start))
    }

    fn draft(patient: &str, doctor: &str, day: u32, hour: u32) -> AppointmentDraft {
        AppointmentDraft {
            patient_id: UserID::from(patient),
            doctor_id: UserID::from(doctor),
            date: NaiveDate::from_ymd_opt(2025, 2, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour, 30, 0).unwrap(),
            status: Scheduled,
            kind: "Konsultacja".to_owned(),
            notes: None,
        }
    }

    fn store(policy: TransitionPolicy, clock: Rc<FixedClock>) -> AppointmentStore {
        AppointmentStore::new(Vec::new(), policy, clock)
    }

    #[test]
    fn test_create_assigns_id_and_timestamps() {
        let clock = clock();
        let mut store = store(TransitionPolicy::Strict, clock.clone());
        let input = draft("p1", "d1", 1, 10);

        let created = store.create(input.clone());
        let fetched = store.get_by_id(&created.id).expect("Created appointment not found");

        assert_eq!(fetched, &created);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.created_at, clock.now());
        assert_eq!(created.patient_id, input.patient_id);
        assert_eq!(created.doctor_id, input.doctor_id);
        assert_eq!(created.date, input.date);
        assert_eq!(created.start_time, input.start_time);
        assert_eq!(created.end_time, input.end_time);
        assert_eq!(created.status, input.status);
        assert_eq!(created.kind, input.kind);
        assert_eq!(created.notes, input.notes);
        assert_eq!(created.rating, None);
    }

    #[test]
    fn test_create_gives_distinct_ids() {
        let mut store = store(TransitionPolicy::Strict, clock());
        let first = store.create(draft("p1", "d1", 1, 10));
        let second = store.create(draft("p1", "d1", 1, 10));
        assert_ne!(first.id, second.id, "Two appointments share the same id");
        assert_eq!(store.get_all().len(), 2);
    }

    #[test]
    fn test_update_only_touches_status_and_timestamp() {
        let clock = clock();
        let mut store = store(TransitionPolicy::Strict, clock.clone());
        let before = store.create(draft("p1", "d1", 1, 10));

        clock.advance(Duration::minutes(5));
        let after = store
            .update(&before.id, AppointmentPatch::status(Confirmed))
            .unwrap()
            .expect("Existing appointment not updated");

        assert_eq!(after.status, Confirmed);
        assert!(after.updated_at > before.updated_at, "updated_at did not increase");
        assert_eq!(
            Appointment {
                status: before.status,
                updated_at: before.updated_at,
                ..after
            },
            before,
            "Fields other than status and updated_at were modified"
        );
    }

    #[test]
    fn test_updated_at_increases_with_a_stopped_clock() {
        let mut store = store(TransitionPolicy::Strict, clock());
        let created = store.create(draft("p1", "d1", 1, 10));

        let first = store.update(&created.id, AppointmentPatch::default()).unwrap().unwrap();
        let second = store.update(&created.id, AppointmentPatch::default()).unwrap().unwrap();

        assert!(first.updated_at > created.updated_at);
        assert!(second.updated_at > first.updated_at);
        assert!(second.updated_at >= second.created_at);
    }

    #[test]
    fn test_update_missing_id_is_a_no_op() {
        let mut store = store(TransitionPolicy::Strict, clock());
        let created = store.create(draft("p1", "d1", 1, 10));
        let snapshot = store.get_all().to_vec();

        let missing = AppointmentID::from("does-not-exist");
        assert_eq!(store.update(&missing, AppointmentPatch::status(Confirmed)), Ok(None));
        assert_eq!(store.cancel(&missing), Ok(None));
        assert_eq!(store.get_all(), snapshot.as_slice(), "Collection changed on a missing id");
        assert_eq!(store.get_by_id(&created.id).unwrap().status, Scheduled);
    }

    #[test]
    fn test_cancel_is_update_to_canceled() {
        let clock = clock();
        let mut by_cancel = store(TransitionPolicy::Strict, clock.clone());
        let mut by_update = store(TransitionPolicy::Strict, clock.clone());

        let a = by_cancel.create(draft("p1", "d1", 1, 10));
        let b = by_update.create(draft("p1", "d1", 1, 10));

        clock.advance(Duration::seconds(1));
        let canceled = by_cancel.cancel(&a.id).unwrap().unwrap();
        let updated = by_update
            .update(&b.id, AppointmentPatch::status(Canceled))
            .unwrap()
            .unwrap();

        assert_eq!(canceled.status, Canceled);
        assert_eq!(Appointment { id: b.id.clone(), ..canceled }, updated);
    }

    #[test]
    fn test_filters_preserve_collection_order() {
        let mut store = store(TransitionPolicy::Strict, clock());
        let first = store.create(draft("p1", "d1", 3, 10));
        store.create(draft("p2", "d1", 2, 10));
        let third = store.create(draft("p1", "d2", 1, 9));

        let patient = UserID::from("p1");
        let ids: Vec<_> = store.get_by_patient(&patient).map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![first.id.clone(), third.id.clone()]);

        let doctor = UserID::from("d1");
        assert_eq!(store.get_by_doctor(&doctor).count(), 2);
        assert!(store.get_by_doctor(&doctor).all(|a| a.doctor_id == doctor));

        let nobody = UserID::from("p9");
        assert_eq!(store.get_by_patient(&nobody).count(), 0);
    }

    #[test]
    fn test_filters_outlive_their_key() {
        let mut store = store(TransitionPolicy::Strict, clock());
        store.create(draft("p1", "d1", 3, 10));
        store.create(draft("p2", "d1", 2, 10));

        let for_doctor: Vec<&Appointment> = store.get_by_doctor(&UserID::from("d1")).collect();
        let for_patient = store.get_by_patient(&UserID::from("p2"));
        assert_eq!(for_doctor.len(), 2);
        assert_eq!(for_patient.count(), 1);
    }

    #[test]
    fn test_strict_policy_rejects_illegal_transition() {
        let mut store = store(TransitionPolicy::Strict, clock());
        let created = store.create(draft("p1", "d1", 1, 10));
        store.update(&created.id, AppointmentPatch::status(Completed)).unwrap();

        let result = store.update(&created.id, AppointmentPatch::status(Scheduled));

        assert_eq!(
            result,
            Err(StoreError::IllegalTransition { from: Completed, to: Scheduled })
        );
        assert_eq!(store.get_by_id(&created.id).unwrap().status, Completed);
    }

    #[test]
    fn test_permissive_policy_accepts_any_transition() {
        let mut store = store(TransitionPolicy::Permissive, clock());
        let created = store.create(draft("p1", "d1", 1, 10));
        store.update(&created.id, AppointmentPatch::status(Completed)).unwrap();

        let reopened = store
            .update(&created.id, AppointmentPatch::status(Scheduled))
            .unwrap()
            .unwrap();

        assert_eq!(reopened.status, Scheduled);
    }

    #[test]
    fn test_rating_patch_keeps_status() {
        let mut store = store(TransitionPolicy::Strict, clock());
        let created = store.create(draft("p1", "d1", 1, 10));
        store.update(&created.id, AppointmentPatch::status(Completed)).unwrap();

        let rating = Rating {
            score: RatingScore::try_from(4_u8).unwrap(),
            comment: Some("Bardzo dobrze".to_owned()),
        };
        let rated = store
            .update(&created.id, AppointmentPatch::rating(rating.clone()))
            .unwrap()
            .unwrap();

        assert_eq!(rated.rating, Some(rating));
        assert_eq!(rated.status, Completed);
    }
}
