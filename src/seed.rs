//! Données de démonstration chargées au démarrage

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::models::{
    Address, Appointment, AppointmentID, AppointmentStatus, Doctor, Patient, Role, UserData, UserID,
};
use crate::utils::input_validation::{Email, InvalidInput, Pesel};

fn user(
    id: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
    phone_number: Option<&str>,
) -> Result<UserData, InvalidInput> {
    Ok(UserData {
        id: UserID::from(id),
        email: Email::try_from(email)?,
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        role,
        phone_number: phone_number.map(str::to_owned),
        is_active: true,
    })
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, InvalidInput> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or(InvalidInput("date"))
}

fn time(h: u32, m: u32) -> Result<NaiveTime, InvalidInput> {
    NaiveTime::from_hms_opt(h, m, 0).ok_or(InvalidInput("heure"))
}

fn instant(value: &str) -> Result<DateTime<Utc>, InvalidInput> {
    value
        .parse::<DateTime<Utc>>()
        .map_err(|_| InvalidInput("horodatage"))
}

/// Un compte par rôle, avec son mot de passe en clair
pub fn accounts() -> Result<Vec<(UserData, &'static str)>, InvalidInput> {
    Ok(vec![
        (
            user("p1", "pacjent@example.com", "Jan", "Kowalski", Role::Patient, Some("123456789"))?,
            "pacjent123",
        ),
        (
            user("d1", "lekarz@example.com", "Anna", "Nowak", Role::Doctor, None)?,
            "lekarz123",
        ),
        (
            user("r1", "recepcja@example.com", "Marta", "Wiśniewska", Role::Receptionist, None)?,
            "recepcja123",
        ),
        (
            user("a1", "admin@example.com", "Piotr", "Zieliński", Role::Administrator, None)?,
            "admin123",
        ),
    ])
}

pub fn patients() -> Result<Vec<Patient>, InvalidInput> {
    Ok(vec![
        Patient {
            user: user("p1", "pacjent@example.com", "Jan", "Kowalski", Role::Patient, Some("123456789"))?,
            pesel: Some(Pesel::try_from("90010112349")?),
            date_of_birth: Some(date(1990, 1, 1)?),
            address: Some(Address {
                street: Some("ul. Przykładowa 1".to_owned()),
                city: Some("Warszawa".to_owned()),
                postal_code: Some("00-001".to_owned()),
            }),
        },
        Patient {
            user: user("p2", "anna.nowak@example.com", "Anna", "Nowak", Role::Patient, Some("987654321"))?,
            pesel: Some(Pesel::try_from("85020223453")?),
            date_of_birth: Some(date(1985, 2, 2)?),
            address: Some(Address {
                street: Some("ul. Testowa 2".to_owned()),
                city: Some("Kraków".to_owned()),
                postal_code: Some("30-001".to_owned()),
            }),
        },
    ])
}

pub fn doctors() -> Result<Vec<Doctor>, InvalidInput> {
    let doctor = |user: UserData, specialization: &str, license_number: &str| Doctor {
        user,
        specialization: specialization.to_owned(),
        license_number: license_number.to_owned(),
        about: None,
    };

    Ok(vec![
        doctor(
            user("d1", "lekarz@example.com", "Anna", "Nowak", Role::Doctor, None)?,
            "Kardiologia",
            "KAR/123456",
        ),
        doctor(
            user("d2", "jan.kowalczyk@example.com", "Jan", "Kowalczyk", Role::Doctor, None)?,
            "Pediatria",
            "PED/654321",
        ),
        doctor(
            user("d3", "maria.wisniewska@example.com", "Maria", "Wiśniewska", Role::Doctor, None)?,
            "Dermatologia",
            "DER/789123",
        ),
    ])
}

pub fn appointments() -> Result<Vec<Appointment>, InvalidInput> {
    Ok(vec![
        Appointment {
            id: AppointmentID::from("app1"),
            patient_id: UserID::from("p1"),
            doctor_id: UserID::from("d1"),
            date: date(2025, 1, 15)?,
            start_time: time(9, 0)?,
            end_time: time(9, 30)?,
            status: AppointmentStatus::Scheduled,
            kind: "Konsultacja".to_owned(),
            notes: None,
            rating: None,
            created_at: instant("2025-01-01T10:00:00Z")?,
            updated_at: instant("2025-01-01T10:00:00Z")?,
        },
        Appointment {
            id: AppointmentID::from("app2"),
            patient_id: UserID::from("p1"),
            doctor_id: UserID::from("d1"),
            date: date(2025, 1, 20)?,
            start_time: time(14, 30)?,
            end_time: time(15, 0)?,
            status: AppointmentStatus::Confirmed,
            kind: "Badanie kontrolne".to_owned(),
            notes: None,
            rating: None,
            created_at: instant("2025-01-05T12:00:00Z")?,
            updated_at: instant("2025-01-05T14:30:00Z")?,
        },
    ])
}
