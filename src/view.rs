//! Console view of the valuation page
//!
//! Mirrors the page surface (`zip-code` input, the three value elements and the
//! status container) and renders [`BridgeUpdate`]s as terminal lines. This is the
//! only place that writes user-facing text.

use std::io::Write;

use tokio::sync::broadcast;
use tracing::warn;

use crate::bridge::{BridgeCommand, BridgeUpdate};
use crate::state::{Severity, ValuationKind};

/// Shown in a value element until its event arrives
pub const NOT_AVAILABLE: &str = "Not available yet";

/// Text input holding the ZIP code (`zip-code`)
#[derive(Debug, Clone, Default)]
pub struct ZipCodeField {
    value: String,
}

impl ZipCodeField {
    pub const ID: &'static str = "zip-code";

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.trim().to_string();
    }
}

/// Parsed session input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(BridgeCommand),
    /// The `zip-code` field was edited
    ZipCodeSet,
    Help,
    Quit,
    Unknown(String),
}

/// Parse one line of session input.
///
/// `smartzip` and `average` take the ZIP code from the argument when given,
/// otherwise from the `zip-code` field. An empty field is passed through so the
/// bridge can prompt for it.
pub fn parse_command(line: &str, zip_field: &mut ZipCodeField) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?;
    let arg = parts.next();

    let input = match verb.to_ascii_lowercase().as_str() {
        "zip" => {
            zip_field.set(arg.unwrap_or(""));
            Input::ZipCodeSet
        }
        "smartzip" => {
            if let Some(zip) = arg {
                zip_field.set(zip);
            }
            Input::Command(BridgeCommand::RequestSmartZipValue(
                zip_field.value().to_string(),
            ))
        }
        "average" => {
            if let Some(zip) = arg {
                zip_field.set(zip);
            }
            Input::Command(BridgeCommand::GetAverageValue(zip_field.value().to_string()))
        }
        "withdraw" => Input::Command(BridgeCommand::WithdrawLink),
        "query" => Input::Command(BridgeCommand::QueryValuations),
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    };

    Some(input)
}

pub const HELP: &str = "\
Commands:
  zip <code>         set the ZIP code field
  smartzip [code]    request a SmartZip valuation
  average [code]     request a ProspectNow valuation (average follows on-chain)
  withdraw           withdraw remaining LINK tokens
  query              read stored valuations
  quit               leave the session";

/// Console rendition of the valuation page
#[derive(Debug, Clone)]
pub struct PageView {
    connected: bool,
    smart_zip: String,
    prospect_now: String,
    average: String,
    status: Vec<(String, Severity)>,
    /// Index of the status line kept in sight
    scroll_to: Option<usize>,
}

impl Default for PageView {
    fn default() -> Self {
        Self {
            connected: false,
            smart_zip: NOT_AVAILABLE.to_string(),
            prospect_now: NOT_AVAILABLE.to_string(),
            average: NOT_AVAILABLE.to_string(),
            status: Vec::new(),
            scroll_to: None,
        }
    }
}

impl PageView {
    /// Text content of a value element by its identifier
    pub fn element_text(&self, id: &str) -> Option<&str> {
        match id {
            "smartzip-value" => Some(&self.smart_zip),
            "prospectnow-value" => Some(&self.prospect_now),
            "average-value" => Some(&self.average),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn status_lines(&self) -> &[(String, Severity)] {
        &self.status
    }

    pub fn scroll_position(&self) -> Option<usize> {
        self.scroll_to
    }

    /// Apply an update and return the lines it renders
    pub fn apply(&mut self, update: &BridgeUpdate) -> Vec<String> {
        match update {
            BridgeUpdate::Connected { account } => {
                self.connected = true;
                let mut lines = vec![format!("Wallet account: {}", account)];
                lines.push("Property Valuation Results".to_string());
                lines.extend(self.results());
                lines
            }
            BridgeUpdate::StatusAppended(entry) => {
                self.status.push((entry.message.clone(), entry.severity));
                self.scroll_to = Some(self.status.len() - 1);
                vec![format!(
                    "[{}] {}",
                    entry.severity.as_str(),
                    entry.message
                )]
            }
            BridgeUpdate::SlotUpdated { kind, formatted } => {
                let text = format!("${}", formatted);
                match kind {
                    ValuationKind::SmartZip => self.smart_zip = text,
                    ValuationKind::ProspectNow => self.prospect_now = text,
                    ValuationKind::Average => self.average = text,
                }
                // The status line that follows carries the announcement
                Vec::new()
            }
            BridgeUpdate::Prompt(message) => vec![format!("! {}", message)],
        }
    }

    /// Current results section, one line per valuation
    pub fn results(&self) -> Vec<String> {
        ValuationKind::ALL
            .iter()
            .map(|kind| {
                format!(
                    "  {} Value: {}",
                    kind.label(),
                    self.element_text(kind.element_id()).unwrap_or(NOT_AVAILABLE)
                )
            })
            .collect()
    }

    /// Apply `update` and write its lines to `out`
    pub fn render<W: Write>(&mut self, update: &BridgeUpdate, out: &mut W) -> std::io::Result<()> {
        for line in self.apply(update) {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }
}

/// Render updates to stdout until the bridge goes away
pub async fn run_view(mut updates: broadcast::Receiver<BridgeUpdate>) -> PageView {
    let mut view = PageView::default();
    let stdout = std::io::stdout();

    loop {
        match updates.recv().await {
            Ok(update) => {
                let mut out = stdout.lock();
                if let Err(e) = view.render(&update, &mut out) {
                    warn!(error = %e, "Failed to write to console");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped = skipped, "View fell behind, updates skipped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    view
}
