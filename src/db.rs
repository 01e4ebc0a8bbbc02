//! État de l'application en mémoire: les stores et l'horloge partagée

use std::rc::Rc;

use log::info;

use crate::config::Settings;
use crate::models::{Doctor, Patient, PatientPatch, Role, UserData, UserID};
use crate::seed;
use crate::stores::appointments::AppointmentStore;
use crate::stores::auth::AuthStore;
use crate::stores::doctors::DoctorStore;
use crate::stores::documents::DocumentStore;
use crate::stores::patients::PatientStore;
use crate::stores::schedules::ScheduleStore;
use crate::stores::StoreError;
use crate::utils::clock::Clock;
use crate::utils::input_validation::{Email, Pesel};

/// Les données propres au rôle d'un nouveau compte
#[derive(Debug, Clone)]
pub enum NewProfile {
    Patient {
        pesel: Option<Pesel>,
    },
    Doctor {
        specialization: String,
        license_number: String,
    },
    Receptionist,
    Administrator,
}

impl NewProfile {
    pub fn role(&self) -> Role {
        match self {
            NewProfile::Patient { .. } => Role::Patient,
            NewProfile::Doctor { .. } => Role::Doctor,
            NewProfile::Receptionist => Role::Receptionist,
            NewProfile::Administrator => Role::Administrator,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone_number: Option<String>,
    pub password: String,
    pub profile: NewProfile,
}

pub struct Database {
    pub auth: AuthStore,
    pub appointments: AppointmentStore,
    pub doctors: DoctorStore,
    pub patients: PatientStore,
    pub documents: DocumentStore,
    pub schedules: ScheduleStore,
    clock: Rc<dyn Clock>,
}

impl Database {
    pub fn empty(settings: &Settings, clock: Rc<dyn Clock>) -> Self {
        Self {
            auth: AuthStore::new(settings.login_delay),
            appointments: AppointmentStore::new(Vec::new(), settings.transitions, clock.clone()),
            doctors: DoctorStore::new(Vec::new()),
            patients: PatientStore::new(Vec::new()),
            documents: DocumentStore::new(),
            schedules: ScheduleStore::default(),
            clock,
        }
    }

    /// Une base contenant les comptes, médecins, patients et visites de démonstration
    pub fn seeded(settings: &Settings, clock: Rc<dyn Clock>) -> Result<Self, StoreError> {
        let mut db = Self::empty(settings, clock.clone());

        for (user, password) in seed::accounts()? {
            db.auth.register(user, password)?;
        }
        db.doctors = DoctorStore::new(seed::doctors()?);
        db.patients = PatientStore::new(seed::patients()?);
        db.appointments = AppointmentStore::new(seed::appointments()?, settings.transitions, clock);

        info!(
            "Base initialisée: {} comptes, {} médecins, {} patients, {} visites",
            db.auth.users().count(),
            db.doctors.get_all().count(),
            db.patients.get_all().len(),
            db.appointments.get_all().len()
        );
        Ok(db)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Crée le compte, puis la fiche patient ou médecin correspondant au rôle
    pub fn create_user(&mut self, new_user: NewUser) -> Result<UserData, StoreError> {
        let NewUser {
            first_name,
            last_name,
            email,
            phone_number,
            password,
            profile,
        } = new_user;

        let user = UserData {
            id: UserID::new(),
            email,
            first_name,
            last_name,
            role: profile.role(),
            phone_number,
            is_active: true,
        };

        self.auth.register(user.clone(), &password)?;

        match profile {
            NewProfile::Patient { pesel } => self.patients.insert(Patient {
                user: user.clone(),
                date_of_birth: pesel.as_ref().and_then(Pesel::birth_date),
                pesel,
                address: None,
            }),
            NewProfile::Doctor {
                specialization,
                license_number,
            } => self.doctors.insert(Doctor {
                user: user.clone(),
                specialization,
                license_number,
                about: None,
            }),
            NewProfile::Receptionist | NewProfile::Administrator => {}
        }

        Ok(user)
    }

    /// Vrai si l'email appartient déjà à un compte ou à une fiche autre que `owner`
    fn email_taken(&self, email: &Email, owner: &UserID) -> bool {
        let other = |user: &UserData| &user.email == email && &user.id != owner;

        self.auth.email_taken(email, owner)
            || self.doctors.get_all_records().iter().any(|d| other(&d.user))
            || self.patients.get_all().iter().any(|p| other(&p.user))
    }

    /// Modifie une fiche patient et reporte ses coordonnées sur le compte.
    /// `Ok(None)` si le patient n'existe pas.
    pub fn update_patient(&mut self, id: &UserID, patch: PatientPatch) -> Result<Option<Patient>, StoreError> {
        if let Some(email) = &patch.email {
            if self.email_taken(email, id) {
                return Err(StoreError::DuplicateEmail(email.clone()));
            }
        }

        let Some(patient) = self.patients.update(id, patch) else {
            return Ok(None);
        };
        self.auth.sync_profile(&patient.user);
        Ok(Some(patient))
    }

    /// Active ou désactive un compte et la fiche qui lui est rattachée.
    /// Les fiches sans compte (médecins ou patients sans identifiants) sont
    /// traitées de la même façon.
    pub fn set_user_active(&mut self, id: &UserID, active: bool) -> Option<UserData> {
        let account = self.auth.set_active(id, active).cloned();
        let doctor = self.doctors.set_active(id, active).map(|d| d.user.clone());
        let patient = self.patients.set_active(id, active).map(|p| p.user.clone());
        let user = account.or(doctor).or(patient)?;

        info!(
            "Compte {} {}",
            user.email,
            if active { "activé" } else { "désactivé" }
        );
        Some(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::SystemClock;
    use chrono::NaiveDate;

    fn db() -> Database {
        Database::seeded(&Settings::for_tests(), Rc::new(SystemClock)).expect("Seeding failed")
    }

    fn new_user(email: &str, profile: NewProfile) -> NewUser {
        NewUser {
            first_name: "Ewa".to_owned(),
            last_name: "Lis".to_owned(),
            email: Email::try_from(email).unwrap(),
            phone_number: None,
            password: "Kx8$wQ2!nB4%pZ".to_owned(),
            profile,
        }
    }

    #[test]
    fn test_seed_contents() {
        let db = db();
        assert_eq!(db.auth.users().count(), 4);
        assert_eq!(db.doctors.get_all().count(), 3);
        assert_eq!(db.patients.get_all().len(), 2);
        assert_eq!(db.appointments.get_all().len(), 2);
        assert!(db.documents.is_empty());
    }

    #[test]
    fn test_create_patient_account() {
        let mut db = db();
        let pesel = Pesel::try_from("02270803624").unwrap();
        let user = db
            .create_user(new_user("ewa.lis@example.com", NewProfile::Patient { pesel: Some(pesel) }))
            .unwrap();

        assert_eq!(user.role, Role::Patient);
        let patient = db.patients.get_by_id(&user.id).expect("Patient record not created");
        assert_eq!(patient.date_of_birth, NaiveDate::from_ymd_opt(2002, 7, 8));
        assert!(db.doctors.get_by_id(&user.id).is_none());
    }

    #[test]
    fn test_create_doctor_account() {
        let mut db = db();
        let user = db
            .create_user(new_user(
                "ewa.lis@example.com",
                NewProfile::Doctor {
                    specialization: "Neurologia".to_owned(),
                    license_number: "NEU/111222".to_owned(),
                },
            ))
            .unwrap();

        assert_eq!(db.doctors.get_by_specialization("Neurologia").count(), 1);
        assert_eq!(db.auth.get_user(&user.id), Some(&user));
    }

    #[test]
    fn test_create_user_rejects_duplicate_email() {
        let mut db = db();
        let result = db.create_user(new_user("lekarz@example.com", NewProfile::Receptionist));

        assert!(matches!(result, Err(StoreError::DuplicateEmail(_))));
        assert_eq!(db.auth.users().count(), 4, "Account added despite duplicate email");
    }

    #[test]
    fn test_deactivation_reaches_every_record() {
        let mut db = db();
        let doctor = UserID::from("d1");

        let user = db.set_user_active(&doctor, false).expect("Account not found");
        assert!(!user.is_active);
        assert!(!db.doctors.get_by_id(&doctor).unwrap().user.is_active);
        assert_eq!(db.doctors.get_all().count(), 2);

        assert!(db.set_user_active(&UserID::from("nobody"), false).is_none());
    }

    #[test]
    fn test_deactivation_of_records_without_account() {
        let mut db = db();
        let doctor = UserID::from("d2");
        assert!(db.auth.get_user(&doctor).is_none());

        let user = db.set_user_active(&doctor, false).expect("Doctor record not found");
        assert!(!user.is_active);
        assert_eq!(db.doctors.get_all().count(), 2);

        let patient = UserID::from("p2");
        assert!(!db.set_user_active(&patient, false).unwrap().is_active);
        assert!(!db.patients.get_by_id(&patient).unwrap().user.is_active);
    }

    #[test]
    fn test_patient_update_reaches_the_account() {
        let mut db = db();
        let id = UserID::from("p1");
        let patch = |email: &str| PatientPatch {
            email: Some(Email::try_from(email).unwrap()),
            ..PatientPatch::default()
        };

        for taken in ["admin@example.com", "anna.nowak@example.com", "jan.kowalczyk@example.com"] {
            assert_eq!(
                db.update_patient(&id, patch(taken)),
                Err(StoreError::DuplicateEmail(Email::try_from(taken).unwrap())),
                "{taken} was accepted although it is in use"
            );
        }
        assert_eq!(db.patients.get_by_id(&id).unwrap().user.email.as_ref(), "pacjent@example.com");

        let patient = db
            .update_patient(&id, patch("jan.nowy@example.com"))
            .unwrap()
            .expect("Seeded patient missing");
        assert_eq!(db.auth.get_user(&id).map(|u| &u.email), Some(&patient.user.email));
        assert!(db.auth.login("jan.nowy@example.com", "pacjent123").is_ok());

        assert_eq!(
            db.update_patient(&id, patch("jan.nowy@example.com")).map(|p| p.is_some()),
            Ok(true),
            "Keeping one's own email is not a duplicate"
        );
        assert_eq!(db.update_patient(&UserID::from("nobody"), PatientPatch::default()), Ok(None));
    }
}
