// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état de présentation de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Séparation : la Session (état wallet) vient du controller, App ne fait
//    que la recevoir et l'afficher
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// ============================================================================

use crate::models::Session;

/// Message affiché après une inscription valide
pub const SIGN_UP_SUCCESS: &str = "✅ Sign-up successful! Now install MetaMask to continue.";

// ============================================================================
// Enum : View
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Trois vues mutuellement exclusives
// - Dérivées de (session.connected, show_sign_up), jamais stockées
// ============================================================================

/// Vues de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Accueil : bouton de connexion + lien vers l'inscription
    Disconnected,

    /// Pas de wallet : formulaire d'inscription + lien d'installation
    SignUp,

    /// Compte autorisé : solde, statut, envoi, déconnexion
    Connected,
}

/// Champ actif du formulaire d'inscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignUpField {
    #[default]
    Email,
    Password,
    Confirm,
}

impl SignUpField {
    pub fn next(&self) -> Self {
        match self {
            SignUpField::Email => SignUpField::Password,
            SignUpField::Password => SignUpField::Confirm,
            SignUpField::Confirm => SignUpField::Email,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            SignUpField::Email => SignUpField::Confirm,
            SignUpField::Password => SignUpField::Email,
            SignUpField::Confirm => SignUpField::Password,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignUpField::Email => "Email",
            SignUpField::Password => "Password",
            SignUpField::Confirm => "Confirm Password",
        }
    }
}

/// Formulaire d'inscription (présentation uniquement, rien n'est envoyé)
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub focus: SignUpField,

    /// Erreur de validation de la dernière soumission
    pub error: Option<String>,
}

impl SignUpForm {
    /// Buffer du champ actif
    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            SignUpField::Email => &mut self.email,
            SignUpField::Password => &mut self.password,
            SignUpField::Confirm => &mut self.confirm,
        }
    }

    /// Valeur d'un champ
    pub fn value(&self, field: SignUpField) -> &str {
        match field {
            SignUpField::Email => &self.email,
            SignUpField::Password => &self.password,
            SignUpField::Confirm => &self.confirm,
        }
    }

    /// Vérifie les champs, comme les attributs `required` d'un formulaire HTML
    pub fn validate(&self) -> Result<(), String> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("Please enter a valid email".to_string());
        }
        if self.password.is_empty() {
            return Err("Please create a password".to_string());
        }
        if self.password != self.confirm {
            return Err("Passwords do not match".to_string());
        }
        Ok(())
    }
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Dernier snapshot reçu du controller
    pub session: Session,

    /// Un wallet provider a-t-il été détecté au démarrage ?
    pub provider_detected: bool,

    /// Affiche le formulaire d'inscription (si non connecté)
    pub show_sign_up: bool,

    /// Formulaire d'inscription
    pub sign_up: SignUpForm,

    /// Message affiché après une inscription réussie
    pub sign_up_notice: Option<String>,

    /// Indique si l'utilisateur a demandé à quitter (attend confirmation)
    /// CONCEPT : Two-step quit pour éviter les sorties accidentelles
    /// - Première pression de 'q' : confirm_quit = true
    /// - Deuxième pression de 'q' : running = false (quit réel)
    /// - N'importe quelle autre touche : confirm_quit = false (annulation)
    pub confirm_quit: bool,

    /// Une opération wallet est en cours (connect, envoi)
    pub is_loading: bool,

    /// Message de chargement optionnel
    pub loading_message: Option<String>,
}

impl App {
    /// Crée l'état initial ; `provider_detected` vient de detect_provider()
    pub fn new(provider_detected: bool) -> Self {
        Self {
            running: true,
            session: Session::new(),
            provider_detected,
            show_sign_up: false,
            sign_up: SignUpForm::default(),
            sign_up_notice: None,
            confirm_quit: false,
            is_loading: false,
            loading_message: None,
        }
    }

    /// Vue courante
    ///
    /// CONCEPT : État dérivé
    /// - Connecté l'emporte toujours sur l'inscription
    pub fn view(&self) -> View {
        if self.session.connected {
            View::Connected
        } else if self.show_sign_up {
            View::SignUp
        } else {
            View::Disconnected
        }
    }

    /// Remplace le snapshot de session (reçu par channel)
    pub fn apply_session(&mut self, session: Session) {
        if session.connected {
            self.show_sign_up = false;
        }
        self.session = session;
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Ouvre le formulaire d'inscription
    pub fn open_sign_up(&mut self) {
        self.show_sign_up = true;
        self.sign_up = SignUpForm::default();
    }

    /// Retour à l'accueil
    pub fn close_sign_up(&mut self) {
        self.show_sign_up = false;
        self.sign_up = SignUpForm::default();
    }

    pub fn is_on_sign_up(&self) -> bool {
        self.view() == View::SignUp
    }

    pub fn is_connected(&self) -> bool {
        self.view() == View::Connected
    }

    pub fn is_disconnected(&self) -> bool {
        self.view() == View::Disconnected
    }

    // ========================================================================
    // Formulaire d'inscription
    // ========================================================================

    pub fn next_field(&mut self) {
        self.sign_up.focus = self.sign_up.focus.next();
    }

    pub fn previous_field(&mut self) {
        self.sign_up.focus = self.sign_up.focus.previous();
    }

    /// Ajoute un caractère au champ actif
    pub fn append_char(&mut self, c: char) {
        self.sign_up.focused_mut().push(c);
        self.sign_up.error = None;
    }

    /// Supprime le dernier caractère du champ actif
    pub fn backspace(&mut self) {
        self.sign_up.focused_mut().pop();
    }

    /// Soumet le formulaire
    ///
    /// Succès : notice affichée, formulaire vidé. Échec : erreur affichée,
    /// formulaire conservé. Retourne true en cas de succès.
    pub fn submit_sign_up(&mut self) -> bool {
        match self.sign_up.validate() {
            Ok(()) => {
                self.sign_up = SignUpForm::default();
                self.sign_up_notice = Some(SIGN_UP_SUCCESS.to_string());
                true
            }
            Err(message) => {
                self.sign_up.error = Some(message);
                false
            }
        }
    }

    // ========================================================================
    // Quit confirmation
    // ========================================================================

    /// Demande la confirmation de quitter
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    /// Vérifie si on attend la confirmation de quit
    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Chargement
    // ========================================================================

    /// Démarre le chargement avec un message optionnel
    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    /// Termine le chargement
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    /// Vérifie si une opération est en cours
    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
