//! Registre des médecins

use std::collections::BTreeSet;

use crate::models::{Doctor, UserID};

pub struct DoctorStore {
    doctors: Vec<Doctor>,
}

impl DoctorStore {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self { doctors }
    }

    pub fn get_by_id(&self, id: &UserID) -> Option<&Doctor> {
        self.doctors.iter().find(|doctor| &doctor.user.id == id)
    }

    /// Les médecins actifs
    pub fn get_all(&self) -> impl Iterator<Item = &Doctor> + '_ {
        self.doctors.iter().filter(|doctor| doctor.user.is_active)
    }

    pub fn get_by_specialization<'a>(&'a self, specialization: &str) -> impl Iterator<Item = &'a Doctor> + 'a {
        let specialization = specialization.to_owned();
        self.get_all()
            .filter(move |doctor| doctor.specialization == specialization)
    }

    /// Recherche sur le nom ou la spécialisation, parmi les médecins actifs
    pub fn search<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a Doctor> + 'a {
        let needle = term.to_lowercase();
        self.get_all().filter(move |doctor| {
            doctor.user.matches(&needle) || doctor.specialization.to_lowercase().contains(&needle)
        })
    }

    /// Tous les médecins, actifs ou non
    pub fn get_all_records(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn specializations(&self) -> BTreeSet<&str> {
        self.get_all()
            .map(|doctor| doctor.specialization.as_str())
            .collect()
    }

    pub fn insert(&mut self, doctor: Doctor) {
        self.doctors.push(doctor);
    }

    pub fn set_active(&mut self, id: &UserID, active: bool) -> Option<&Doctor> {
        let doctor = self.doctors.iter_mut().find(|doctor| &doctor.user.id == id)?;
        doctor.user.is_active = active;
        Some(doctor)
    }
}
