//! Comptes, identifiants et session courante

use std::{thread, time::Duration};

use log::{info, warn};
use thiserror::Error;

use crate::models::{SessionUser, UserData, UserID};
use crate::stores::StoreError;
use crate::utils::input_validation::Email;
use crate::utils::password_utils::{hash, verify, PWHash};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Email ou mot de passe invalide")]
    InvalidCredentials,

    #[error("Ce compte a été désactivé")]
    AccountDisabled,
}

struct Account {
    user: UserData,
    password: PWHash,
}

/// La table des comptes et la session courante (au plus une par processus)
pub struct AuthStore {
    accounts: Vec<Account>,
    session: Option<SessionUser>,
    login_delay: Duration,
}

impl AuthStore {
    pub fn new(login_delay: Duration) -> Self {
        Self {
            accounts: Vec::new(),
            session: None,
            login_delay,
        }
    }

    /// Ajoute un compte à la table des identifiants
    pub fn register(&mut self, user: UserData, password: &str) -> Result<(), StoreError> {
        if self.accounts.iter().any(|a| a.user.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let password = hash(password).map_err(|_| StoreError::PasswordHash)?;

        info!("Compte {} enregistré ({:?})", user.email, user.role);
        self.accounts.push(Account { user, password });
        Ok(())
    }

    /// Après une latence simulée, cherche le compte par email exact et
    /// vérifie le mot de passe. En cas d'échec, la session n'est pas modifiée.
    pub fn login(&mut self, email: &str, password: &str) -> Result<SessionUser, LoginError> {
        thread::sleep(self.login_delay);

        let account = self.accounts.iter().find(|a| a.user.email.as_ref() == email);

        if !verify(password, account.map(|a| &a.password)) {
            warn!("Échec de connexion pour {email}");
            return Err(LoginError::InvalidCredentials);
        }
        let Some(account) = account else {
            return Err(LoginError::InvalidCredentials);
        };

        if !account.user.is_active {
            warn!("Connexion refusée, compte désactivé: {email}");
            return Err(LoginError::AccountDisabled);
        }

        let user = SessionUser::from(&account.user);
        info!("Connexion de {} ({:?})", user.email, user.role);
        self.session = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.session.take() {
            info!("Déconnexion de {}", user.email);
        }
    }

    pub fn session(&self) -> Option<&SessionUser> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn users(&self) -> impl Iterator<Item = &UserData> + '_ {
        self.accounts.iter().map(|a| &a.user)
    }

    pub fn get_user(&self, id: &UserID) -> Option<&UserData> {
        self.users().find(|user| &user.id == id)
    }

    /// Vrai si un autre compte que `owner` utilise déjà cet email
    pub fn email_taken(&self, email: &Email, owner: &UserID) -> bool {
        self.users().any(|user| &user.email == email && &user.id != owner)
    }

    /// Reporte les coordonnées d'une fiche sur le compte du même id, et sur
    /// la session si c'est la sienne. Le rôle et l'activation ne changent pas.
    pub fn sync_profile(&mut self, profile: &UserData) -> Option<&UserData> {
        let account = self.accounts.iter_mut().find(|a| a.user.id == profile.id)?;
        account.user.email = profile.email.clone();
        account.user.first_name = profile.first_name.clone();
        account.user.last_name = profile.last_name.clone();
        account.user.phone_number = profile.phone_number.clone();

        if let Some(session) = self.session.as_mut().filter(|s| s.id == profile.id) {
            *session = SessionUser::from(&account.user);
        }
        Some(&account.user)
    }

    pub fn set_active(&mut self, id: &UserID, active: bool) -> Option<&UserData> {
        let account = self.accounts.iter_mut().find(|a| &a.user.id == id)?;
        account.user.is_active = active;
        Some(&account.user)
    }
}
