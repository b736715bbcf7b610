use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::time::{Duration, Instant};

use crate::card::ConverterCard;
use crate::currency::Currency;

/// How long a status message stays on the info line
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Focusable parts of the card, in form order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Amount,
    From,
    Swap,
    To,
    Check,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Amount => Field::From,
            Field::From => Field::Swap,
            Field::Swap => Field::To,
            Field::To => Field::Check,
            Field::Check => Field::Amount,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Amount => Field::Check,
            Field::From => Field::Amount,
            Field::Swap => Field::From,
            Field::To => Field::Swap,
            Field::Check => Field::To,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Picker,
    Help,
}

/// Which selector the picker popup is choosing for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    From,
    To,
}

#[derive(Debug, Clone)]
pub struct Picker {
    pub side: Side,
    pub filter: String,
    pub selected: usize,
}

pub struct App {
    pub card: ConverterCard,
    pub field: Field,
    pub popup: Popup,
    pub picker: Picker,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub fn new(card: ConverterCard) -> Self {
        Self {
            card,
            field: Field::Amount,
            popup: Popup::None,
            picker: Picker {
                side: Side::From,
                filter: String::new(),
                selected: 0,
            },
            status_message: None,
            status_message_time: None,
        }
    }

    /// Issue the one initial fetch
    pub fn start(&mut self) {
        self.card.fetch_exchange_rate();
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        if self.popup != Popup::None {
            return self.handle_popup_key(key);
        }

        self.handle_normal_key(key)
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Tab => self.field = self.field.next(),
            KeyCode::BackTab => self.field = self.field.prev(),

            // Amount editing
            KeyCode::Char(c) if self.field == Field::Amount && (c.is_ascii_digit() || c == '.') => {
                if !self.card.push_amount_char(c) {
                    self.set_status("Amount already has a decimal point");
                }
            }
            KeyCode::Backspace if self.field == Field::Amount => self.card.pop_amount_char(),

            // Currency cycling
            KeyCode::Down | KeyCode::Char('j') => self.step_currency(true),
            KeyCode::Up | KeyCode::Char('k') => self.step_currency(false),

            KeyCode::Enter => match self.field {
                Field::Amount | Field::Check => self.check_rate(),
                Field::From => self.open_picker(Side::From),
                Field::To => self.open_picker(Side::To),
                Field::Swap => self.swap(),
            },

            KeyCode::Char('s') => self.swap(),
            KeyCode::Char('r') => self.check_rate(),
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Picker => self.handle_picker_key(key),
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
            Popup::None => Ok(()),
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.popup = Popup::None,
            KeyCode::Down => {
                let len = self.picker_matches().len();
                if len > 0 {
                    self.picker.selected = (self.picker.selected + 1) % len;
                }
            }
            KeyCode::Up => {
                let len = self.picker_matches().len();
                if len > 0 {
                    self.picker.selected = self.picker.selected.checked_sub(1).unwrap_or(len - 1);
                }
            }
            KeyCode::Enter => {
                let Some(currency) = self.picker_matches().get(self.picker.selected).copied() else {
                    self.set_status(format!("No currency matches \"{}\"", self.picker.filter));
                    return Ok(());
                };
                self.popup = Popup::None;
                self.select(self.picker.side, currency);
            }
            KeyCode::Backspace => {
                self.picker.filter.pop();
                self.picker.selected = 0;
            }
            KeyCode::Char(c) if c.is_ascii_alphabetic() && self.picker.filter.len() < 3 => {
                self.picker.filter.push(c.to_ascii_uppercase());
                self.picker.selected = 0;
            }
            _ => {}
        }
        Ok(())
    }

    /// Currencies shown in the picker: code or flag code starts with the filter
    pub fn picker_matches(&self) -> Vec<Currency> {
        let filter = self.picker.filter.as_str();
        Currency::all()
            .filter(|c| c.code().starts_with(filter) || c.flag_code().starts_with(filter))
            .collect()
    }

    fn open_picker(&mut self, side: Side) {
        let current = match side {
            Side::From => self.card.from_currency(),
            Side::To => self.card.to_currency(),
        };
        self.picker = Picker {
            side,
            filter: String::new(),
            selected: current.position(),
        };
        self.popup = Popup::Picker;
    }

    fn step_currency(&mut self, forward: bool) {
        let side = match self.field {
            Field::From => Side::From,
            Field::To => Side::To,
            _ => return,
        };
        let current = match side {
            Side::From => self.card.from_currency(),
            Side::To => self.card.to_currency(),
        };
        let next = if forward { current.next() } else { current.prev() };
        self.select(side, next);
    }

    fn select(&mut self, side: Side, currency: Currency) {
        let changed = match side {
            Side::From => self.card.select_from(currency),
            Side::To => self.card.select_to(currency),
        };
        if changed {
            tracing::debug!("{:?} currency set to {}", side, currency);
        }
    }

    fn swap(&mut self) {
        self.card.handle_swap();
        self.set_status(format!(
            "Swapped: {} → {}",
            self.card.from_currency(),
            self.card.to_currency()
        ));
    }

    fn check_rate(&mut self) {
        self.card.fetch_exchange_rate();
    }

    /// Apply finished fetches and expire the status message
    pub fn tick(&mut self) {
        self.card.poll_updates();

        if let Some(t) = self.status_message_time {
            if t.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}
