// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI en utilisant les widgets de ratatui
//
// Trois vues mutuellement exclusives (voir app::View) :
// - Disconnected : connexion + lien vers l'inscription
// - SignUp : formulaire + lien d'installation du wallet
// - Connected : statut, solde, envoi, déconnexion
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Widgets : composants UI (Block, Paragraph, etc.)
// 3. Layout : découpage de l'espace en zones
// 4. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::api::provider::MODERN_PROVIDER_VAR;
use crate::app::{App, SignUpField, View};
use crate::config::WALLET_INSTALL_URL;
use crate::models::transaction::{recipient, TRANSFER_AMOUNT_ETHER, TRANSFER_GAS_LIMIT};
use crate::models::units::{display_ether_from_decimal, ETHER_LABEL};
use crate::models::{Address, Session};

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Le compilateur garantit l'exhaustivité (toutes les vues gérées)
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, chunks[0]);

    match app.view() {
        View::Disconnected => render_disconnected(frame, app, chunks[1]),
        View::SignUp => render_sign_up(frame, app, chunks[1]),
        View::Connected => render_connected(frame, app, chunks[1]),
    }

    render_footer(frame, app, chunks[2]);
}

/// Crée le layout principal (header, content, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header : 3 lignes
            Constraint::Min(0),    // Content : tout le reste
            Constraint::Length(3), // Footer : 3 lignes
        ])
        .split(area)
        .to_vec()
}

fn bold(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Dessine le header avec le titre
fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" MyBlock ")
        .title_alignment(Alignment::Center);

    let paragraph = Paragraph::new(Line::from(Span::styled(
        "Blockchain crowdfunding, from your terminal",
        bold(Color::Green),
    )))
    .block(block)
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Ligne de statut colorée selon le type de message
fn status_line(session: &Session) -> Option<Line<'static>> {
    let status = session.status.as_ref()?;
    let color = if status.is_error() { Color::Red } else { Color::Yellow };

    Some(Line::from(vec![
        Span::styled(status.to_string(), Style::default().fg(color)),
        Span::styled(
            format!("  ({})", session.updated_at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
}

// ============================================================================
// Vue : Disconnected
// ============================================================================

fn render_disconnected(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "MyBlock, A blockchain crowdfunding platform",
            bold(Color::White),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[c]", bold(Color::Yellow)),
            Span::raw(" Login with wallet"),
        ]),
        Line::from(""),
        Line::from(Span::styled("Don't have a wallet?", Style::default().fg(Color::Gray))),
        Line::from(vec![
            Span::styled("[s]", bold(Color::Green)),
            Span::raw(" Sign Up"),
        ]),
        Line::from(""),
    ];

    if !app.provider_detected {
        lines.push(Line::from(Span::styled(
            format!("No wallet provider detected (set {})", MODERN_PROVIDER_VAR),
            Style::default().fg(Color::DarkGray),
        )));
    }

    if let Some(status) = status_line(&app.session) {
        lines.push(status);
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Vue : SignUp
// ============================================================================

fn render_sign_up(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Create Your Account ");

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::raw(
            "Please sign up to use MyBlock. You'll need to install MetaMask afterward.",
        )),
        Line::from(""),
    ];

    for field in [SignUpField::Email, SignUpField::Password, SignUpField::Confirm] {
        lines.push(render_field(app, field));
    }
    lines.push(Line::from(""));

    if let Some(error) = &app.sign_up.error {
        lines.push(Line::from(Span::styled(error.clone(), bold(Color::Red))));
    }
    if let Some(notice) = &app.sign_up_notice {
        lines.push(Line::from(Span::styled(notice.clone(), bold(Color::Green))));
    }
    if !app.provider_detected {
        lines.push(Line::from(Span::styled(
            "No wallet provider detected on this machine.",
            Style::default().fg(Color::Yellow),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "After creating your account, you'll need to install MetaMask to interact with the blockchain.",
        Style::default().fg(Color::Gray),
    )));
    lines.push(Line::from(vec![
        Span::raw("Learn more about MetaMask: "),
        Span::styled(
            WALLET_INSTALL_URL,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        ),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Une ligne du formulaire : label, valeur (masquée pour les mots de passe)
fn render_field(app: &App, field: SignUpField) -> Line<'static> {
    let focused = app.sign_up.focus == field;
    let value = app.sign_up.value(field);

    let shown = match field {
        SignUpField::Email => value.to_string(),
        SignUpField::Password | SignUpField::Confirm => "•".repeat(value.chars().count()),
    };

    let marker = if focused { "▶ " } else { "  " };
    let label_style = if focused { bold(Color::Cyan) } else { Style::default().fg(Color::Gray) };

    let mut spans = vec![
        Span::styled(marker, label_style),
        Span::styled(format!("{:<18}", field.label()), label_style),
        Span::styled(shown, Style::default().fg(Color::White)),
    ];
    if focused {
        spans.push(Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    Line::from(spans)
}

// ============================================================================
// Vue : Connected
// ============================================================================

fn render_connected(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Wallet ");

    let session = &app.session;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("You are connected to your wallet!", bold(Color::Green))),
        Line::from(""),
    ];

    if let Some(status) = status_line(session) {
        lines.push(status);
        lines.push(Line::from(""));
    }

    if let Some(account) = &session.account {
        lines.push(Line::from(vec![
            Span::styled("Account: ", Style::default().fg(Color::Gray)),
            Span::raw(account.to_string()),
        ]));
    }

    // Le solde est affiché tel que lu (en wei), avec sa conversion en ether
    let balance = session.balance.clone().unwrap_or_default();
    let ether = display_ether_from_decimal(&balance)
        .map(|ether| format!("  ({} {})", ether, ETHER_LABEL))
        .unwrap_or_default();
    lines.push(Line::from(vec![
        Span::styled("Balance: ", bold(Color::White)),
        Span::raw(balance),
        Span::styled(ether, Style::default().fg(Color::DarkGray)),
    ]));

    lines.push(Line::from(""));
    let treasury = recipient().map(|to| short_address(&to)).unwrap_or_default();
    lines.push(Line::from(Span::styled(
        format!(
            "[t] sends {} {} (gas {}) to the MyBlock treasury {}",
            TRANSFER_AMOUNT_ETHER, ETHER_LABEL, TRANSFER_GAS_LIMIT, treasury
        ),
        Style::default().fg(Color::Gray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Forme abrégée d'une adresse : 0xd503…Cd33
fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

// ============================================================================
// Footer : Instructions
// ============================================================================

/// Dessine le footer avec les raccourcis clavier de la vue courante
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", bold(Color::Yellow)),
            Span::styled("[q]", bold(Color::Red).add_modifier(Modifier::SLOW_BLINK)),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                bold(Color::Yellow),
            ),
        ])
    } else if let (true, Some(message)) = (app.is_loading_data(), &app.loading_message) {
        Line::from(Span::styled(format!("⏳ {}", message), bold(Color::Yellow)))
    } else {
        match app.view() {
            View::Disconnected => Line::from(vec![
                Span::styled("[c]", bold(Color::Yellow)),
                Span::raw(" Login  "),
                Span::styled("[s]", bold(Color::Green)),
                Span::raw(" Sign Up  "),
                Span::styled("[q]", bold(Color::Yellow)),
                Span::raw(" Quit"),
            ]),
            View::SignUp => Line::from(vec![
                Span::styled("[Tab]", bold(Color::Yellow)),
                Span::raw(" Next field  "),
                Span::styled("[Enter]", bold(Color::Green)),
                Span::raw(" Create Account  "),
                Span::styled("[ESC]", bold(Color::Red)),
                Span::raw(" Back"),
            ]),
            View::Connected => Line::from(vec![
                Span::styled("[t]", bold(Color::Green)),
                Span::raw(" Send transaction  "),
                Span::styled("[d]", bold(Color::Red)),
                Span::raw(" Disconnect  "),
                Span::styled("[q]", bold(Color::Yellow)),
                Span::raw(" Quit"),
            ]),
        }
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================
