use std::fmt;
use std::iter;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use derive_more::Display;
use inquire::{Confirm, CustomType, DateSelect, Editor, Password, PasswordDisplayMode, Select, Text};
use medibook::authorization::{Action, Enforcer};
use medibook::config::Settings;
use medibook::dashboard::Dashboard;
use medibook::db::{Database, NewProfile, NewUser};
use medibook::models::*;
use medibook::reports::{DateRange, ReportKind};
use medibook::routing::{NavItem, Navigation, Route};
use medibook::services::{AppointmentFilter, BookingRequest, Service, UserFilter};
use medibook::utils::clock::SystemClock;
use medibook::utils::input_validation::{parse_time, Email, Pesel, RatingScore};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

type MenuExit = Option<()>;
const MENU_EXIT: MenuExit = None;
const MENU_LOOP: MenuExit = Some(());

/// Représente un menu texte
trait Menu {
    /// Implémente le contenu du menu. La valeur de retour
    /// doit être None si le menu souhaite terminer,
    /// ou Some(()) s'il faut le relancer.
    fn enter(&mut self) -> Result<MenuExit>;

    /// Lance le menu en boucle, en interceptant les erreurs,
    /// sauf si le menu souhaite quitter.
    fn enter_loop(&mut self) {
        while let Some(result) = self.enter().transpose() {
            if let Err(error) = result {
                eprintln!("Erreur: {error}");
            }
        }
    }
}

/// Un choix "tous" ou une valeur précise, pour les filtres
enum Filter<T> {
    All,
    Only(T),
}

impl<T: fmt::Display> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("Tous"),
            Filter::Only(value) => value.fmt(f),
        }
    }
}

fn choose_filter<T: fmt::Display + IntoEnumIterator>(message: &str) -> Result<Option<T>> {
    let options: Vec<Filter<T>> = iter::once(Filter::All).chain(T::iter().map(Filter::Only)).collect();
    Ok(match Select::new(message, options).prompt()? {
        Filter::All => None,
        Filter::Only(value) => Some(value),
    })
}

/// Un champ texte facultatif: vide devient `None`
fn optional(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

pub struct App {
    service: Service,
}

impl App {
    pub fn new(service: Service) -> Self {
        App { service }
    }

    pub fn start(&mut self) -> Result<()> {
        println!("Bienvenue sur MEDIBOOK, la prise de rendez-vous médicaux en ligne.");
        self.enter_loop();
        Ok(())
    }
}

impl Menu for App {
    fn enter(&mut self) -> Result<MenuExit> {
        #[derive(EnumIter, Display)]
        enum Choice {
            #[display("Se connecter")]
            Login,
            #[display("Quitter")]
            Exit,
        }

        let choice = Select::new("Que voulez-vous faire ?", Choice::iter().collect()).prompt()?;

        match choice {
            Choice::Login => {
                let email = Text::new("Email: ").prompt()?;
                let password = Password::new("Entrez votre mot de passe : ")
                    .without_confirmation()
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .prompt()?;

                let user = self.service.login(email.trim(), &password)?;

                eprintln!("[*] Bienvenue, {user} ({}).", user.role);
                UserMenu {
                    service: &mut self.service,
                }
                .enter_loop();
                self.service.logout();
                Ok(MENU_LOOP)
            }
            Choice::Exit => Ok(MENU_EXIT),
        }
    }
}

#[derive(Display)]
enum Entry {
    #[display("{_0}")]
    Page(&'static NavItem),
    #[display("Se déconnecter")]
    Logout,
}

struct UserMenu<'srv> {
    service: &'srv mut Service,
}

impl Menu for UserMenu<'_> {
    fn enter(&mut self) -> Result<MenuExit> {
        let mut entries: Vec<Entry> = self.service.menu().into_iter().map(Entry::Page).collect();
        entries.push(Entry::Logout);

        let Entry::Page(item) = Select::new("Que voulez-vous faire ?", entries).prompt()? else {
            return Ok(MENU_EXIT);
        };
        self.open(&item.route.to_string())?;
        Ok(MENU_LOOP)
    }
}

impl UserMenu<'_> {
    fn open(&mut self, path: &str) -> Result<()> {
        let route = match self.service.navigate(path) {
            Navigation::Render(route) => route,
            Navigation::Redirect(route) => {
                println!("[!] Page indisponible, redirection vers {route}");
                return Ok(());
            }
            Navigation::NotFound => return Err(anyhow!("Page introuvable: {path}")),
        };

        match route {
            Route::Login => Ok(()),
            Route::Dashboard => self.dashboard(),
            Route::Appointments => self.appointments(),
            Route::NewAppointment => self.book(false),
            Route::ManualAppointment => self.book(true),
            Route::AppointmentDetails(id) => {
                AppointmentMenu {
                    service: self.service,
                    id,
                }
                .enter_loop();
                Ok(())
            }
            Route::RateAppointment(id) => rate(self.service, &id),
            Route::Schedule => self.schedule(),
            Route::Patients => self.patients(),
            Route::MedicalNote(id) => write_document(self.service, &id, DocumentKind::MedicalNote),
            Route::Prescription(id) => write_document(self.service, &id, DocumentKind::Prescription),
            Route::Referral(id) => write_document(self.service, &id, DocumentKind::Referral),
            Route::Users => self.users(),
            Route::NewUser => self.new_user(),
            Route::Reports => self.reports(),
        }
    }

    fn dashboard(&mut self) -> Result<()> {
        match self.service.dashboard()? {
            Dashboard::Patient { upcoming } => {
                println!("Vos prochaines visites:");
                print_appointments(&upcoming);
            }
            Dashboard::Doctor {
                today,
                upcoming_count,
                patient_count,
            } => {
                println!("Visites à venir: {upcoming_count} | Patients: {patient_count}");
                println!("Aujourd'hui:");
                print_appointments(&today);
            }
            Dashboard::Receptionist {
                today,
                today_count,
                upcoming_count,
                active_doctors,
            } => {
                println!(
                    "Visites aujourd'hui: {today_count} | À venir: {upcoming_count} | Médecins actifs: {active_doctors}"
                );
                print_appointments(&today);
            }
            Dashboard::Administrator {
                active_accounts,
                total_accounts,
                report_count,
            } => {
                println!("Comptes actifs: {active_accounts}/{total_accounts}");
                println!("Rapports disponibles: {report_count}");
            }
        }
        Ok(())
    }

    fn appointments(&mut self) -> Result<()> {
        let filter = AppointmentFilter {
            search: Text::new("Rechercher (vide pour tout afficher):").prompt()?,
            status: choose_filter("Statut:")?,
        };

        let summaries = self.service.list_appointments(&filter)?;
        if summaries.is_empty() {
            println!("[*] Aucune visite");
            return Ok(());
        }

        let Some(selected) = Select::new("Choisissez une visite:", summaries).prompt_skippable()? else {
            return Ok(());
        };
        let id = selected.appointment.id.clone();

        AppointmentMenu {
            service: self.service,
            id,
        }
        .enter_loop();
        Ok(())
    }

    /// Réservation par le patient, ou manuelle par la réception
    fn book(&mut self, manual: bool) -> Result<()> {
        let patient_id = if manual {
            let patients = self.service.patients("")?;
            Some(Select::new("Patient:", patients).prompt()?.user.id.clone())
        } else {
            None
        };

        let specialization = Select::new("Spécialisation:", self.service.specializations())
            .prompt()?
            .to_owned();
        let doctors = self.service.doctors_by_specialization(&specialization);
        let doctor_id = Select::new("Médecin:", doctors).prompt()?.user.id.clone();

        let today = self.service.today();
        let date = DateSelect::new("Date de la visite:")
            .with_min_date(today)
            .with_starting_date(today)
            .prompt()?;

        let slots = self.service.available_slots(&doctor_id, date)?;
        if slots.is_empty() {
            println!("[*] Aucun créneau libre ce jour-là");
            return Ok(());
        }
        let slot = Select::new("Créneau:", slots).prompt()?;

        let appointment = self.service.book_appointment(BookingRequest {
            patient_id,
            doctor_id,
            date,
            start_time: slot.start,
            kind: Text::new("Type de visite:").prompt()?,
            notes: optional(Text::new("Remarques (optionnel):").prompt()?),
        })?;
        println!("[*] Visite réservée: {appointment}");
        Ok(())
    }

    fn schedule(&mut self) -> Result<()> {
        let session = self
            .service
            .session()
            .cloned()
            .ok_or(anyhow!("Aucune session ouverte"))?;

        let doctor_id = if session.role == Role::Doctor {
            session.id.clone()
        } else {
            Select::new("Médecin:", self.service.doctors()).prompt()?.user.id.clone()
        };

        let schedule = self.service.schedule(&doctor_id)?;
        print_schedule(&schedule);

        let date = DateSelect::new("Afficher la journée du:")
            .with_starting_date(self.service.today())
            .prompt()?;
        let day = self.service.doctor_day(&doctor_id, date)?;
        print_appointments(day.appointments.iter().copied());
        for slot in &day.slots {
            let state = if slot.available { "libre" } else { "occupé" };
            println!("  {slot} {state}");
        }

        if session.role == Role::Doctor
            && Confirm::new("Modifier mes horaires ?").with_default(false).prompt()?
        {
            self.edit_schedule(schedule)?;
        }
        Ok(())
    }

    fn edit_schedule(&mut self, mut schedule: DoctorSchedule) -> Result<()> {
        schedule.slot_minutes = CustomType::new("Durée d'une consultation (minutes):")
            .with_default(schedule.slot_minutes)
            .prompt()?;
        schedule.gap_minutes = CustomType::new("Pause entre deux consultations (minutes):")
            .with_default(schedule.gap_minutes)
            .prompt()?;

        if Confirm::new("Ajouter une pause ?").with_default(false).prompt()? {
            let days = schedule.working_hours.iter().map(|hours| hours.weekday).collect();
            let weekday = Select::new("Jour:", days).prompt()?;
            let start = parse_time(&Text::new("Début (HH:MM):").prompt()?)?;
            let end = parse_time(&Text::new("Fin (HH:MM):").prompt()?)?;
            schedule.breaks.push(DayHours { weekday, start, end });
        }

        self.service.update_schedule(schedule)?;
        println!("[*] Horaires mis à jour");
        Ok(())
    }

    fn patients(&mut self) -> Result<()> {
        let term = Text::new("Rechercher un patient (nom, email, PESEL):").prompt()?;
        let patients = self.service.patients(&term)?;
        if patients.is_empty() {
            println!("[*] Aucun patient trouvé");
            return Ok(());
        }

        let Some(patient) = Select::new("Choisissez un patient:", patients).prompt_skippable()? else {
            return Ok(());
        };
        print_patient(patient);
        let id = patient.user.id.clone();

        let receptionist = self.service.session().is_some_and(|s| s.role == Role::Receptionist);
        if receptionist && Confirm::new("Modifier cette fiche ?").with_default(false).prompt()? {
            let phone_number = optional(Text::new("Téléphone (vide pour conserver):").prompt()?);
            let address = match optional(Text::new("Rue (vide pour conserver l'adresse):").prompt()?) {
                Some(street) => Some(Address {
                    street: Some(street),
                    city: optional(Text::new("Ville:").prompt()?),
                    postal_code: optional(Text::new("Code postal:").prompt()?),
                }),
                None => None,
            };
            let patch = PatientPatch {
                phone_number,
                address,
                ..PatientPatch::default()
            };
            let updated = self.service.update_patient(&id, patch)?;
            print_patient(&updated);
        }
        Ok(())
    }

    fn users(&mut self) -> Result<()> {
        let filter = UserFilter {
            search: Text::new("Rechercher (nom, email):").prompt()?,
            role: choose_filter("Rôle:")?,
            active: None,
        };

        let users: Vec<UserLine> = self.service.users(&filter)?.into_iter().map(UserLine).collect();
        let Some(UserLine(user)) = Select::new("Choisissez un compte:", users).prompt_skippable()? else {
            return Ok(());
        };
        let (id, active) = (user.id.clone(), user.is_active);

        let question = if active {
            "Désactiver ce compte ?"
        } else {
            "Réactiver ce compte ?"
        };
        if Confirm::new(question).with_default(false).prompt()? {
            let user = self.service.set_user_active(&id, !active)?;
            println!("[*] {}", UserLine(&user));
        }
        Ok(())
    }

    fn new_user(&mut self) -> Result<()> {
        let role = Select::new("Rôle du compte:", Role::iter().collect()).prompt()?;
        let first_name = Text::new("Prénom:").prompt()?;
        let last_name = Text::new("Nom:").prompt()?;
        let email = Email::try_from(Text::new("Email:").prompt()?)?;
        let phone_number = optional(Text::new("Téléphone (optionnel):").prompt()?);

        let profile = match role {
            Role::Patient => NewProfile::Patient {
                pesel: optional(Text::new("PESEL (optionnel):").prompt()?)
                    .map(Pesel::try_from)
                    .transpose()?,
            },
            Role::Doctor => NewProfile::Doctor {
                specialization: Text::new("Spécialisation:").prompt()?,
                license_number: Text::new("Numéro d'autorisation:").prompt()?,
            },
            Role::Receptionist => NewProfile::Receptionist,
            Role::Administrator => NewProfile::Administrator,
        };

        let password = Password::new("Mot de passe initial:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()?;

        let user = self.service.create_user(NewUser {
            first_name,
            last_name,
            email,
            phone_number,
            password,
            profile,
        })?;
        println!("[*] Compte créé: {}", UserLine(&user));
        Ok(())
    }

    fn reports(&mut self) -> Result<()> {
        let kind = Select::new("Rapport:", ReportKind::iter().collect()).prompt()?;
        println!("{}", kind.description());

        let default = DateRange::iter()
            .position(|range| range == DateRange::default())
            .unwrap_or(0);
        let range = Select::new("Période:", DateRange::iter().collect())
            .with_starting_cursor(default)
            .prompt()?;

        print!("{}", self.service.report(kind, range)?);
        Ok(())
    }
}

#[derive(Display)]
enum ActionChoice {
    #[display("{_0}")]
    Do(Action),
    #[display("Retour")]
    Back,
}

struct AppointmentMenu<'srv> {
    service: &'srv mut Service,
    id: AppointmentID,
}

impl Menu for AppointmentMenu<'_> {
    fn enter(&mut self) -> Result<MenuExit> {
        let details = match self.service.appointment(&self.id) {
            Ok(details) => details,
            Err(e) => {
                println!("[!] {e}");
                return Ok(MENU_EXIT);
            }
        };

        println!("\n{}", details.summary);
        let appointment = details.summary.appointment;
        if let Some(notes) = &appointment.notes {
            println!("Remarques: {notes}");
        }
        if let Some(rating) = &appointment.rating {
            println!(
                "Évaluation: {}/5 {}",
                rating.score,
                rating.comment.as_deref().unwrap_or_default()
            );
        }
        for document in &details.documents {
            print_document(document);
        }

        let mut choices: Vec<ActionChoice> = details.actions.iter().copied().map(ActionChoice::Do).collect();
        choices.push(ActionChoice::Back);

        let ActionChoice::Do(action) = Select::new("Action:", choices).prompt()? else {
            return Ok(MENU_EXIT);
        };

        match action {
            Action::Confirm => {
                self.service.confirm(&self.id)?;
            }
            Action::Cancel => {
                if Confirm::new("Annuler cette visite ?").with_default(false).prompt()? {
                    self.service.cancel(&self.id)?;
                }
            }
            Action::Complete => {
                self.service.complete(&self.id)?;
            }
            Action::Rate => rate(self.service, &self.id)?,
            Action::Document => {
                let kind = Select::new("Type de document:", DocumentKind::iter().collect()).prompt()?;
                write_document(self.service, &self.id, kind)?;
            }
            Action::Read | Action::Create => {}
        }
        Ok(MENU_LOOP)
    }
}

fn rate(service: &mut Service, id: &AppointmentID) -> Result<()> {
    let score: u8 = CustomType::new("Note (1 à 5):")
        .with_error_message("Entrez un nombre entre 1 et 5")
        .prompt()?;
    let score = RatingScore::try_from(score)?;
    let comment = Text::new("Commentaire (optionnel):").prompt()?;

    service.rate(id, score, Some(comment))?;
    println!("[*] Merci pour votre évaluation");
    Ok(())
}

#[derive(Clone, Copy, EnumIter, Display)]
enum DocumentKind {
    #[display("Note médicale")]
    MedicalNote,
    #[display("Ordonnance")]
    Prescription,
    #[display("Orientation")]
    Referral,
}

fn write_document(service: &mut Service, id: &AppointmentID, kind: DocumentKind) -> Result<()> {
    let content = match kind {
        DocumentKind::MedicalNote => DocumentContent::MedicalNote {
            content: Editor::new("Note médicale:").prompt()?,
        },
        DocumentKind::Prescription => {
            let mut medications = Vec::new();
            loop {
                medications.push(Medication {
                    name: Text::new("Médicament:").prompt()?,
                    dosage: Text::new("Dosage:").prompt()?,
                    frequency: Text::new("Fréquence:").prompt()?,
                    duration: Text::new("Durée du traitement:").prompt()?,
                });
                if !Confirm::new("Ajouter un autre médicament ?").with_default(false).prompt()? {
                    break;
                }
            }
            DocumentContent::Prescription {
                medications,
                notes: optional(Text::new("Remarques (optionnel):").prompt()?),
            }
        }
        DocumentKind::Referral => DocumentContent::Referral {
            specialization: Text::new("Orienter vers (spécialisation):").prompt()?,
            urgency: Select::new("Urgence:", Urgency::iter().collect()).prompt()?,
            reason: Text::new("Motif:").prompt()?,
            notes: optional(Text::new("Remarques (optionnel):").prompt()?),
        },
    };

    let document = service.add_document(id, content)?;
    println!("[*] Document enregistré: {document}");
    Ok(())
}

struct UserLine<'a>(&'a UserData);

impl fmt::Display for UserLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let user = self.0;
        write!(f, "{user} <{}> - {}", user.email, user.role)?;
        if !user.is_active {
            f.write_str(" (désactivé)")?;
        }
        Ok(())
    }
}

fn print_appointments<'a>(appointments: impl IntoIterator<Item = &'a Appointment>) {
    let mut empty = true;
    for appointment in appointments {
        println!("  {appointment}");
        empty = false;
    }
    if empty {
        println!("  [*] Aucune visite");
    }
}

fn print_patient(patient: &Patient) {
    let Patient {
        user,
        pesel,
        date_of_birth,
        address,
    } = patient;

    println!("{user} <{}>", user.email);
    if let Some(phone) = &user.phone_number {
        println!("Téléphone: {phone}");
    }
    if let Some(pesel) = pesel {
        println!("PESEL: {pesel}");
    }
    if let Some(date) = date_of_birth {
        println!("Date de naissance: {}", date.format("%Y-%m-%d"));
    }
    if let Some(address) = address {
        let parts: Vec<&str> = [&address.street, &address.postal_code, &address.city]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect();
        println!("Adresse: {}", parts.join(", "));
    }
}

fn print_schedule(schedule: &DoctorSchedule) {
    println!(
        "Consultations de {} minutes, {} minutes entre deux",
        schedule.slot_minutes, schedule.gap_minutes
    );
    for hours in &schedule.working_hours {
        println!(
            "  {}: {}-{}",
            hours.weekday,
            hours.start.format("%H:%M"),
            hours.end.format("%H:%M")
        );
    }
    for pause in &schedule.breaks {
        println!(
            "  Pause {}: {}-{}",
            pause.weekday,
            pause.start.format("%H:%M"),
            pause.end.format("%H:%M")
        );
    }
}

fn print_document(document: &ClinicalDocument) {
    println!("--- {document}");
    match &document.content {
        DocumentContent::MedicalNote { content } => println!("{content}"),
        DocumentContent::Prescription { medications, notes } => {
            for medication in medications {
                println!(
                    "  {} {}, {} pendant {}",
                    medication.name, medication.dosage, medication.frequency, medication.duration
                );
            }
            if let Some(notes) = notes {
                println!("{notes}");
            }
        }
        DocumentContent::Referral {
            specialization,
            urgency,
            reason,
            notes,
        } => {
            println!("Vers: {specialization} ({urgency})\nMotif: {reason}");
            if let Some(notes) = notes {
                println!("{notes}");
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    simple_logging::log_to_file(&settings.log_file, log::LevelFilter::Info)?;

    let db = Database::seeded(&settings, Rc::new(SystemClock))?;
    let enforcer = Enforcer::load()?;
    App::new(Service::new(db, enforcer)).start()
}
