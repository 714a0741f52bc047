// ============================================================================
// MyBlock - Wallet TUI
// ============================================================================
// Programme TUI qui se connecte à un wallet provider (JSON-RPC), affiche le
// solde du compte autorisé et envoie un transfert fixe de 0.01 ETH.
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Worker thread : runtime tokio dédié aux appels au wallet
// 4. Channels : commandes vers le worker, snapshots de session vers l'UI
// ============================================================================

use std::io;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use myblock::api::{detect_provider, HostEnvironment};
use myblock::app::App;
use myblock::config::Config;
use myblock::controller::WalletSessionController;
use myblock::models::Session;
use myblock::ui::{events::EventHandler, render};

// ============================================================================
// AppCommand : Commandes pour le worker thread
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des commandes au worker thread
// - Le worker thread exécute les appels async au wallet
// - Les résultats reviennent sous forme de Session (autre channel)
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppCommand {
    /// Demander l'autorisation et lire le solde
    Connect,

    /// Repasser en déconnecté (état local) et libérer l'abonnement
    Disconnect,

    /// Envoyer le transfert fixe
    SendTransaction,
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place, avec rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans `config.log_dir` (voir Config::default) :
/// - Linux/WSL : ~/.local/share/myblock/logs/myblock.log
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f ~/.local/share/myblock/logs/myblock.log.*
///
/// # Contrôler le niveau de log
/// RUST_LOG=debug cargo run
/// RUST_LOG=myblock=trace cargo run
/// ```
fn init_logging(config: &Config) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = config.log_dir.clone();

    // Crée le répertoire s'il n'existe pas
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "myblock.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: myblock::api::rpc)
                .with_thread_ids(true) // Inclut l'ID du thread (UI vs worker)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour myblock, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "myblock=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'installation du subscriber tracing")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = Config::from_env();

    // Initialize logging FIRST
    init_logging(&config).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(?config, "MyBlock starting up");

    // CONCEPT RUST : mpsc channels
    // - command_tx/rx : commandes UI -> worker
    // - session_tx/rx : snapshots de session controller -> UI
    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (session_tx, session_rx) = mpsc::channel::<Session>();

    // Détection du wallet provider (aucun appel réseau, warn! si absent)
    // L'absence de provider est affichée dans l'UI (vue Disconnected)
    let provider = detect_provider(&HostEnvironment::from_env(), &config);
    let controller = WalletSessionController::new(provider, config, session_tx);

    // CONCEPT RUST : Arc<Mutex<>> pour partage entre threads
    // - L'UI lit App pour dessiner
    // - Le worker active l'indicateur de chargement
    let app = Arc::new(Mutex::new(App::new(controller.has_provider())));

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, controller, app.clone());

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, app, &events, command_tx, session_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Verrouille App, même si un autre thread a paniqué en la tenant
fn lock_app(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Background async worker avec channels
// - Thread séparé qui possède le runtime tokio ET le controller
// - block_on() bloque le worker, jamais l'UI
// - Les tâches spawnées (abonnement, reçus) tournent sur le runtime
//   tant que le worker est vivant
// ============================================================================

/// Worker thread qui exécute les opérations wallet en arrière-plan
fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    mut controller: WalletSessionController,
    app: Arc<Mutex<App>>,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to create tokio runtime, worker disabled");
                return;
            }
        };

        loop {
            match command_rx.recv() {
                Ok(command) => {
                    info!(?command, "Worker received command");

                    match command {
                        AppCommand::Connect => {
                            lock_app(&app).start_loading(Some("Connexion au wallet...".to_string()));
                            let session = runtime.block_on(controller.connect());
                            debug!(
                                connected = session.connected,
                                subscribed = controller.is_subscribed(),
                                "Connect finished"
                            );
                            lock_app(&app).stop_loading();
                        }

                        AppCommand::SendTransaction => {
                            lock_app(&app).start_loading(Some("Envoi de la transaction...".to_string()));
                            // Le suivi du reçu continue en tâche de fond sur le runtime
                            let watcher = runtime.block_on(controller.send_transaction());
                            debug!(
                                pending_receipt = watcher.is_some(),
                                status = %controller.session().status_text(),
                                "Send finished"
                            );
                            lock_app(&app).stop_loading();
                        }

                        AppCommand::Disconnect => {
                            controller.disconnect();
                        }
                    }
                }
                Err(_) => {
                    // Channel fermé, on quitte
                    info!("Worker thread exiting (channel closed)");
                    break;
                }
            }
        }
    });
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// CONCEPT : Event Loop Pattern
// 0. Appliquer les sessions reçues du worker
// 1. Dessiner l'interface (render)
// 2. Traiter les événements (input)
// ============================================================================

/// Exécute la boucle principale de l'application
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    session_rx: mpsc::Receiver<Session>,
) -> Result<()> {
    loop {
        if !lock_app(&app).is_running() {
            break;
        }

        // ========================================
        // 0. SESSIONS : applique les snapshots du controller
        // ========================================
        // CONCEPT : Non-blocking receive avec try_recv
        // - On vide le channel : seul le dernier snapshot compte vraiment
        loop {
            match session_rx.try_recv() {
                Ok(session) => lock_app(&app).apply_session(session),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    warn!("Controller channel closed");
                    break;
                }
            }
        }

        // ========================================
        // 1. RENDER : Dessine l'interface
        // ========================================
        {
            let app_lock = lock_app(&app);
            terminal.draw(|frame| render(frame, &app_lock))?;
        }

        // ========================================
        // 2. INPUT : Traite les événements
        // ========================================
        match events.next() {
            Ok(event) => handle_event(&mut lock_app(&app), event, &command_tx),
            Err(e) => debug!(error = ?e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Envoie une commande au worker (log si le worker est mort)
fn send_command(command_tx: &mpsc::Sender<AppCommand>, command: AppCommand) {
    if command_tx.send(command).is_err() {
        error!(?command, "Worker thread is gone, command dropped");
    }
}

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching avec guards
/// - Les raccourcis dépendent de la vue courante
/// - Dans le formulaire, toutes les touches servent à la saisie
fn handle_event(app: &mut App, event: myblock::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use myblock::ui::events::{
        is_connect_event, is_disconnect_event, is_quit_event, is_send_event, is_sign_up_event, Event,
    };

    match event {
        // Formulaire d'inscription : capture toutes les touches
        Event::Key(_) if app.is_on_sign_up() => handle_sign_up_event(app, &event),

        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        // 'c' : connexion, ou formulaire d'inscription si aucun wallet
        Event::Key(_) if is_connect_event(&event) && app.is_disconnected() => {
            app.cancel_quit();
            if app.provider_detected {
                info!("User requested wallet connection");
                send_command(command_tx, AppCommand::Connect);
            } else {
                info!("No wallet provider, showing sign-up");
                app.open_sign_up();
            }
        }

        Event::Key(_) if is_sign_up_event(&event) && app.is_disconnected() => {
            app.cancel_quit();
            info!("User opened sign-up form");
            app.open_sign_up();
        }

        Event::Key(_) if is_send_event(&event) && app.is_connected() => {
            app.cancel_quit();
            info!("User requested transaction");
            send_command(command_tx, AppCommand::SendTransaction);
        }

        Event::Key(_) if is_disconnect_event(&event) && app.is_connected() => {
            app.cancel_quit();
            info!("User requested disconnect");
            send_command(command_tx, AppCommand::Disconnect);
        }

        Event::Tick => {}

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation si active
            app.cancel_quit();
        }
    }
}

/// Saisie dans le formulaire d'inscription
fn handle_sign_up_event(app: &mut App, event: &myblock::ui::events::Event) {
    use myblock::ui::events::{
        get_char_from_event, is_backspace_event, is_enter_event, is_escape_event, is_next_field_event,
        is_previous_field_event, is_text_char_event,
    };

    if is_escape_event(event) {
        debug!("User left sign-up form");
        app.close_sign_up();
    } else if is_enter_event(event) {
        if app.submit_sign_up() {
            info!("Sign-up form submitted");
        } else {
            debug!(error = ?app.sign_up.error, "Sign-up form rejected");
        }
    } else if is_next_field_event(event) {
        app.next_field();
    } else if is_previous_field_event(event) {
        app.previous_field();
    } else if is_backspace_event(event) {
        app.backspace();
    } else if is_text_char_event(event) {
        if let Some(c) = get_char_from_event(event) {
            app.append_char(c);
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;

    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;

    terminal.show_cursor()?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
