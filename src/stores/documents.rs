//! Documents médicaux rédigés après une visite

use chrono::NaiveDate;
use log::info;

use crate::models::{Appointment, AppointmentID, ClinicalDocument, DocumentContent, DocumentID, UserID};

#[derive(Default)]
pub struct DocumentStore {
    documents: Vec<ClinicalDocument>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rattache un document à la visite, au patient et au médecin de celle-ci
    pub fn add(&mut self, appointment: &Appointment, content: DocumentContent, date: NaiveDate) -> ClinicalDocument {
        let document = ClinicalDocument {
            id: DocumentID::new(),
            appointment_id: appointment.id.clone(),
            patient_id: appointment.patient_id.clone(),
            doctor_id: appointment.doctor_id.clone(),
            date,
            content,
        };

        info!(
            "{} {} ajouté(e) à la visite {}",
            document.content.title(),
            document.id,
            document.appointment_id
        );
        self.documents.push(document.clone());
        document
    }

    pub fn for_appointment<'a>(&'a self, id: &AppointmentID) -> impl Iterator<Item = &'a ClinicalDocument> + 'a {
        let id = id.clone();
        self.documents
            .iter()
            .filter(move |document| document.appointment_id == id)
    }

    pub fn for_patient<'a>(&'a self, id: &UserID) -> impl Iterator<Item = &'a ClinicalDocument> + 'a {
        let id = id.clone();
        self.documents
            .iter()
            .filter(move |document| document.patient_id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
