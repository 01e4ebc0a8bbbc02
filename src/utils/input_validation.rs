use chrono::{NaiveDate, NaiveTime};
use derive_more::derive::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zxcvbn::{zxcvbn, Score};

// Regex for email addresses
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("Failed to compile email regex")
});

// Regex for wall-clock times, HH:MM
static TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("Failed to compile time regex")
});

static MIN_SCORE: Score = Score::Three;

const PESEL_WEIGHTS: [u32; 10] = [1, 3, 7, 9, 1, 3, 7, 9, 1, 3];

/// Une entrée refusée, avec le nom du champ concerné
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Entrée invalide: {0}")]
pub struct InvalidInput(pub &'static str);

/// This function checks if the given password is strong enough for a new account.
/// The email is used as a user input so that passwords derived from it are rejected.
pub fn password_validation(password: &str, email: &str) -> bool {
    let local_part = email.split('@').next().unwrap_or(email);

    if password.eq_ignore_ascii_case(email) || password.eq_ignore_ascii_case(local_part) {
        return false;
    }

    if password.len() < 8 || password.len() > 64 {
        return false;
    }

    let estimate = zxcvbn(password, &[email, local_part]);

    estimate.score() >= MIN_SCORE
}

/// Wrapper type for an email address that has been validated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub struct Email(String);

impl TryFrom<String> for Email {
    type Error = InvalidInput;

    fn try_from(email: String) -> Result<Self, Self::Error> {
        if EMAIL_REGEX.is_match(&email) {
            Ok(Self(email))
        } else {
            Err(InvalidInput("email"))
        }
    }
}

impl TryFrom<&str> for Email {
    type Error = InvalidInput;

    fn try_from(email: &str) -> Result<Self, Self::Error> {
        Self::try_from(email.trim().to_owned())
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Wrapper type for a PESEL national identification number that has been validated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
pub struct Pesel(String);

impl TryFrom<String> for Pesel {
    type Error = InvalidInput;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if validate_pesel(&value) {
            Ok(Pesel(value))
        } else {
            Err(InvalidInput("PESEL"))
        }
    }
}

impl TryFrom<&str> for Pesel {
    type Error = InvalidInput;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.trim().to_owned())
    }
}

impl AsRef<str> for Pesel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Pesel {
    /// Date de naissance encodée dans les six premiers chiffres.
    /// Le siècle est porté par le mois (+80 pour 1800, +20 pour 2000, ...).
    pub fn birth_date(&self) -> Option<NaiveDate> {
        let digit = |i: usize| self.0[i..=i].parse::<u32>().ok();
        let year = digit(0)? * 10 + digit(1)?;
        let month = digit(2)? * 10 + digit(3)?;
        let day = digit(4)? * 10 + digit(5)?;

        let (century, month) = match month {
            1..=12 => (1900, month),
            21..=32 => (2000, month - 20),
            41..=52 => (2100, month - 40),
            61..=72 => (2200, month - 60),
            81..=92 => (1800, month - 80),
            _ => return None,
        };

        NaiveDate::from_ymd_opt((century + year) as i32, month, day)
    }
}

fn validate_pesel(pesel: &str) -> bool {
    if pesel.len() != 11 || !pesel.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = pesel.chars().filter_map(|c| c.to_digit(10)).collect();

    let sum: u32 = digits
        .iter()
        .zip(PESEL_WEIGHTS.iter())
        .map(|(digit, weight)| digit * weight)
        .sum();

    if (10 - sum % 10) % 10 != digits[10] {
        return false;
    }

    Pesel(pesel.to_owned()).birth_date().is_some()
}

/// Note d'une visite, entre 1 et 5
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub struct RatingScore(u8);

impl RatingScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for RatingScore {
    type Error = InvalidInput;

    fn try_from(score: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&score) {
            Ok(Self(score))
        } else {
            Err(InvalidInput("note"))
        }
    }
}

/// Parse an `HH:MM` wall-clock time
pub fn parse_time(value: &str) -> Result<NaiveTime, InvalidInput> {
    let value = value.trim();
    if !TIME_REGEX.is_match(value) {
        return Err(InvalidInput("heure"));
    }
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| InvalidInput("heure"))
}

/// Refuse a text field that is empty once trimmed
pub fn non_empty(value: &str, field: &'static str) -> Result<String, InvalidInput> {
    let value = value.trim();
    if value.is_empty() {
        Err(InvalidInput(field))
    } else {
        Ok(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod email_wrapper_tests {
        use super::*;

        #[test]
        fn test_valid_email() {
            let valid_cases = vec![
                "pacjent@example.com",
                "jan.kowalczyk@example.com",
                "first+tag@sub.domain.pl",
            ];

            for email in valid_cases {
                assert!(Email::try_from(email).is_ok(),
                        "Valid email {} was rejected !", email);
            }
        }

        #[test]
        fn test_invalid_email() {
            let invalid_cases = vec![
                "",
                "no-at-sign.com",
                "two@@example.com",
                "missing@tld",
                "spaces in@example.com",
                "@example.com",
            ];

            for email in invalid_cases {
                assert!(Email::try_from(email).is_err(),
                        "Invalid email {} was approved !", email);
            }
        }

        #[test]
        fn test_email_is_trimmed() {
            let email = Email::try_from("  admin@example.com ").unwrap();
            assert_eq!(email.as_ref(), "admin@example.com");
        }
    }

    mod pesel_tests {
        use super::*;

        #[test]
        fn test_valid_pesel() {
            let valid_cases = vec![
                "90010112349",
                "85020223453",
                "02270803624", // born in 2002
            ];

            for pesel in valid_cases {
                assert!(Pesel::try_from(pesel).is_ok(),
                        "Valid PESEL {} was rejected !", pesel)
            }
        }

        #[test]
        fn test_invalid_pesel() {
            let invalid_cases = vec![
                "90010112345", // Invalid check digit
                "9001011234",  // Too short
                "900101123490", // Too long
                "9001O112349", // Letter O
                "90130112341", // Month 13
                "",
            ];

            for pesel in invalid_cases {
                assert!(Pesel::try_from(pesel).is_err(),
                        "Invalid PESEL {} was accepted !", pesel)
            }
        }

        #[test]
        fn test_pesel_birth_date() {
            let pesel = Pesel::try_from("90010112349").unwrap();
            assert_eq!(pesel.birth_date(), NaiveDate::from_ymd_opt(1990, 1, 1));

            let pesel = Pesel::try_from("02270803624").unwrap();
            assert_eq!(pesel.birth_date(), NaiveDate::from_ymd_opt(2002, 7, 8));
        }
    }

    mod rating_tests {
        use super::*;

        #[test]
        fn test_rating_bounds() {
            assert!(RatingScore::try_from(0_u8).is_err(), "A score of 0 was accepted");
            assert!(RatingScore::try_from(6_u8).is_err(), "A score of 6 was accepted");
            for score in 1..=5_u8 {
                assert_eq!(RatingScore::try_from(score).map(|s| s.value()), Ok(score));
            }
        }
    }

    mod time_tests {
        use super::*;

        #[test]
        fn test_parse_time() {
            assert_eq!(parse_time("09:30"), Ok(NaiveTime::from_hms_opt(9, 30, 0).unwrap()));
            assert_eq!(parse_time(" 23:59 "), Ok(NaiveTime::from_hms_opt(23, 59, 0).unwrap()));

            for invalid in ["9:30", "24:00", "12:60", "noon", ""] {
                assert!(parse_time(invalid).is_err(), "Invalid time {} was accepted", invalid);
            }
        }

        #[test]
        fn test_non_empty() {
            assert_eq!(non_empty("  Konsultacja ", "type"), Ok("Konsultacja".to_owned()));
            assert_eq!(non_empty("   ", "type"), Err(InvalidInput("type")));
        }
    }

    mod password_tests {
        use super::*;

        #[test]
        fn test_password_strength_levels() {
            let email = "nowy.lekarz@example.com";

            let test_cases = vec![
                // (password, expected_valid)
                ("short", false),
                ("password123", false),
                ("abcdefghijklm", false),
                ("q7#Vm!2zLx9@Rt", true),
                ("Kx8$wQ2!nB4%pZ", true),
            ];

            for (password, expected_valid) in test_cases {
                assert_eq!(password_validation(password, email), expected_valid,
                           "Password '{}' validation result was unexpected", password);
            }
        }

        #[test]
        fn test_password_email_correlation() {
            let email = "nowy.lekarz@example.com";

            assert!(!password_validation(email, email),
                    "Password identical to the email was accepted");
            assert!(!password_validation("NOWY.LEKARZ", email),
                    "Password identical to the email local part was accepted");
        }
    }
}
