//! Hachage et vérification des mots de passe des comptes

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHashString, PasswordVerifier, SaltString},
    Argon2, PasswordHasher,
};
use std::sync::LazyLock;

static DEFAULT_HASHER: LazyLock<Argon2<'static>> = LazyLock::new(Argon2::default);

/// Haché de référence pour un email inconnu, pour que la vérification
/// prenne le même temps que pour un compte existant
static DUMMY_HASH: LazyLock<Option<PWHash>> = LazyLock::new(|| hash("").ok());

/// Un mot de passe haché (format PHC)
#[derive(Clone, Debug)]
pub struct PWHash(PasswordHashString);

/// Calcule un haché Argon2id avec un sel aléatoire
pub fn hash(password: &str) -> Result<PWHash, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = DEFAULT_HASHER
        .hash_password(password.as_bytes(), &salt)?
        .serialize();

    Ok(PWHash(hash))
}

/// Vérifie un mot de passe contre le haché stocké.
///
/// Sans haché (compte inconnu), la vérification est tout de même
/// faite contre un haché factice, et le résultat est toujours faux.
pub fn verify(password: &str, maybe_hash: Option<&PWHash>) -> bool {
    let Some(hash) = maybe_hash.or(DUMMY_HASH.as_ref()) else {
        return false;
    };

    let matches = DEFAULT_HASHER
        .verify_password(password.as_bytes(), &hash.0.password_hash())
        .is_ok();

    matches && maybe_hash.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_matching_password() {
        let stored = hash("lekarz123").unwrap();
        assert!(verify("lekarz123", Some(&stored)), "Correct password was rejected");
        assert!(!verify("lekarz124", Some(&stored)), "Wrong password was accepted");
    }

    #[test]
    fn test_unknown_account_never_verifies() {
        assert!(!verify("", None), "Empty password matched the dummy hash");
        assert!(!verify("anything", None), "Password verified without any stored hash");
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash("same").unwrap();
        let second = hash("same").unwrap();
        assert_ne!(first.0.as_str(), second.0.as_str(), "Two hashes share the same salt");
    }
}
