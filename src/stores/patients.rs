//! Registre des patients

use crate::models::{Patient, PatientPatch, UserID};

pub struct PatientStore {
    patients: Vec<Patient>,
}

impl PatientStore {
    pub fn new(patients: Vec<Patient>) -> Self {
        Self { patients }
    }

    pub fn get_by_id(&self, id: &UserID) -> Option<&Patient> {
        self.patients.iter().find(|patient| &patient.user.id == id)
    }

    pub fn get_all(&self) -> &[Patient] {
        &self.patients
    }

    /// Recherche sur le nom, l'email ou le PESEL
    pub fn search<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a Patient> + 'a {
        let term = term.trim().to_owned();
        self.patients.iter().filter(move |patient| {
            patient.user.matches(&term)
                || patient
                    .pesel
                    .as_ref()
                    .is_some_and(|pesel| pesel.as_ref().contains(term.as_str()))
        })
    }

    /// Fusionne `patch` dans le patient; `None` s'il n'existe pas.
    /// Pas d'horodatage sur les patients.
    pub fn update(&mut self, id: &UserID, patch: PatientPatch) -> Option<Patient> {
        let patient = self.patients.iter_mut().find(|patient| &patient.user.id == id)?;
        patch.apply_to(patient);
        Some(patient.clone())
    }

    pub fn insert(&mut self, patient: Patient) {
        self.patients.push(patient);
    }

    pub fn set_active(&mut self, id: &UserID, active: bool) -> Option<&Patient> {
        let patient = self.patients.iter_mut().find(|patient| &patient.user.id == id)?;
        patient.user.is_active = active;
        Some(patient)
    }
}
