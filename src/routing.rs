//! Pages de l'application et résolution d'un chemin selon la session

use std::fmt;

use log::info;

use crate::authorization::{Context, Enforcer};
use crate::models::{AppointmentID, SessionUser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Appointments,
    NewAppointment,
    ManualAppointment,
    AppointmentDetails(AppointmentID),
    RateAppointment(AppointmentID),
    Schedule,
    Patients,
    MedicalNote(AppointmentID),
    Prescription(AppointmentID),
    Referral(AppointmentID),
    Users,
    NewUser,
    Reports,
}

impl Route {
    /// `None` pour un chemin inconnu. `/` n'est pas une page.
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let id = |s: &&str| AppointmentID::from(*s);

        let route = match segments.as_slice() {
            ["login"] => Route::Login,
            ["dashboard"] => Route::Dashboard,
            ["appointments"] => Route::Appointments,
            ["appointments", "new"] => Route::NewAppointment,
            ["appointments", "manual"] => Route::ManualAppointment,
            ["appointments", appointment] => Route::AppointmentDetails(id(appointment)),
            ["appointments", appointment, "rate"] => Route::RateAppointment(id(appointment)),
            ["schedule"] => Route::Schedule,
            ["patients"] => Route::Patients,
            ["medical-note", appointment] => Route::MedicalNote(id(appointment)),
            ["prescription", appointment] => Route::Prescription(id(appointment)),
            ["referral", appointment] => Route::Referral(id(appointment)),
            ["users"] => Route::Users,
            ["users", "new"] => Route::NewUser,
            ["reports"] => Route::Reports,
            _ => return None,
        };
        Some(route)
    }

    /// Le motif de la route, tel qu'il figure dans la table des rôles
    pub fn pattern(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Appointments => "/appointments",
            Route::NewAppointment => "/appointments/new",
            Route::ManualAppointment => "/appointments/manual",
            Route::AppointmentDetails(_) => "/appointments/:id",
            Route::RateAppointment(_) => "/appointments/:id/rate",
            Route::Schedule => "/schedule",
            Route::Patients => "/patients",
            Route::MedicalNote(_) => "/medical-note/:appointmentId",
            Route::Prescription(_) => "/prescription/:appointmentId",
            Route::Referral(_) => "/referral/:appointmentId",
            Route::Users => "/users",
            Route::NewUser => "/users/new",
            Route::Reports => "/reports",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::AppointmentDetails(id) => write!(f, "/appointments/{id}"),
            Route::RateAppointment(id) => write!(f, "/appointments/{id}/rate"),
            Route::MedicalNote(id) => write!(f, "/medical-note/{id}"),
            Route::Prescription(id) => write!(f, "/prescription/{id}"),
            Route::Referral(id) => write!(f, "/referral/{id}"),
            other => f.write_str(other.pattern()),
        }
    }
}

/// Le résultat de la résolution d'un chemin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
    NotFound,
}

/// Résout un chemin pour la session courante.
///
/// Sans session, toute page protégée renvoie vers `/login`; avec une
/// session, `/login` et les pages interdites au rôle renvoient vers
/// `/dashboard`.
pub fn resolve(path: &str, session: Option<&SessionUser>, enforcer: &Enforcer) -> Navigation {
    if path.split('/').all(str::is_empty) {
        return Navigation::Redirect(Route::Dashboard);
    }

    let Some(route) = Route::parse(path) else {
        info!("Chemin inconnu: {path}");
        return Navigation::NotFound;
    };

    match (session, route.is_public()) {
        (None, true) => Navigation::Render(route),
        (None, false) => Navigation::Redirect(Route::Login),
        (Some(_), true) => Navigation::Redirect(Route::Dashboard),
        (Some(user), false) => match enforcer.with_subject(user).view(&route) {
            Ok(()) => Navigation::Render(route),
            Err(_) => Navigation::Redirect(Route::Dashboard),
        },
    }
}

/// Une entrée du menu de navigation
#[derive(Debug)]
pub struct NavItem {
    pub title: &'static str,
    pub route: Route,
}

impl fmt::Display for NavItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title)
    }
}

pub static NAV_ITEMS: [NavItem; 8] = [
    NavItem { title: "Tableau de bord", route: Route::Dashboard },
    NavItem { title: "Visites", route: Route::Appointments },
    NavItem { title: "Prendre rendez-vous", route: Route::NewAppointment },
    NavItem { title: "Rendez-vous manuel", route: Route::ManualAppointment },
    NavItem { title: "Horaires", route: Route::Schedule },
    NavItem { title: "Patients", route: Route::Patients },
    NavItem { title: "Utilisateurs", route: Route::Users },
    NavItem { title: "Rapports", route: Route::Reports },
];

/// Les entrées du menu visibles par le sujet du contexte
pub fn navigation_menu(context: &Context) -> Vec<&'static NavItem> {
    NAV_ITEMS
        .iter()
        .filter(|item| context.view(&item.route).is_ok())
        .collect()
}
