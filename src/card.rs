//! The converter card: amount, currency pair and the fetched result.
//!
//! Every fetch runs on its own task and reports back over a channel tagged
//! with a generation number. Starting a fetch aborts the one in flight and
//! bumps the generation, so only the most recent request can update the
//! result no matter which response arrives first.

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::currency::flags::{flag_emoji, flag_url};
use crate::currency::Currency;
use crate::exchange::conversion::{
    accepts_char, format_conversion, sanitize_amount, FETCH_ERROR_MESSAGE,
};
use crate::exchange::{Quote, RateClient, RateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Fetching,
    Success,
    Error,
}

/// Flag references for one side of the card
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    pub country_code: &'static str,
    pub emoji: Option<String>,
    pub image_url: Option<String>,
}

/// A finished fetch, with the inputs it was started with
#[derive(Debug)]
struct RateUpdate {
    generation: u64,
    amount: String,
    from: Currency,
    to: Currency,
    outcome: Result<Quote, RateError>,
}

pub struct ConverterCard {
    client: RateClient,
    flag_base_url: String,

    amount: String,
    from: Currency,
    to: Currency,

    exchange_rate: Option<String>,
    last_updated: Option<String>,
    status: FetchStatus,

    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    updates_tx: mpsc::UnboundedSender<RateUpdate>,
    updates_rx: mpsc::UnboundedReceiver<RateUpdate>,
}

impl ConverterCard {
    pub fn new(
        client: RateClient,
        flag_base_url: impl Into<String>,
        amount: &str,
        from: Currency,
        to: Currency,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let mut card = Self {
            client,
            flag_base_url: flag_base_url.into(),
            amount: String::new(),
            from,
            to,
            exchange_rate: None,
            last_updated: None,
            status: FetchStatus::Idle,
            generation: 0,
            in_flight: None,
            updates_tx,
            updates_rx,
        };
        card.set_amount(amount);
        card
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn from_currency(&self) -> Currency {
        self.from
    }

    pub fn to_currency(&self) -> Currency {
        self.to
    }

    /// Formatted result, `None` until the first fetch settles
    pub fn exchange_rate(&self) -> Option<&str> {
        self.exchange_rate.as_deref()
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn is_fetching(&self) -> bool {
        self.status == FetchStatus::Fetching
    }

    /// Replace the amount. Non-numeric characters are dropped; no fetch is issued.
    pub fn set_amount(&mut self, value: &str) {
        self.amount = sanitize_amount(value);
    }

    pub fn push_amount_char(&mut self, c: char) -> bool {
        if accepts_char(&self.amount, c) {
            self.amount.push(c);
            true
        } else {
            false
        }
    }

    pub fn pop_amount_char(&mut self) {
        self.amount.pop();
    }

    /// Select the source currency; a change refetches once
    pub fn set_from_currency(&mut self, code: &str) -> Result<bool> {
        let Some(currency) = Currency::parse(code) else {
            bail!("Unsupported currency: {}", code);
        };
        Ok(self.select_from(currency))
    }

    /// Select the target currency; a change refetches once
    pub fn set_to_currency(&mut self, code: &str) -> Result<bool> {
        let Some(currency) = Currency::parse(code) else {
            bail!("Unsupported currency: {}", code);
        };
        Ok(self.select_to(currency))
    }

    pub fn select_from(&mut self, currency: Currency) -> bool {
        if currency == self.from {
            return false;
        }
        self.from = currency;
        self.fetch_exchange_rate();
        true
    }

    pub fn select_to(&mut self, currency: Currency) -> bool {
        if currency == self.to {
            return false;
        }
        self.to = currency;
        self.fetch_exchange_rate();
        true
    }

    /// Exchange the two currencies, then refetch
    pub fn handle_swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        self.fetch_exchange_rate();
    }

    pub fn from_flag(&self) -> Flag {
        self.flag_for(self.from)
    }

    pub fn to_flag(&self) -> Flag {
        self.flag_for(self.to)
    }

    fn flag_for(&self, currency: Currency) -> Flag {
        Flag {
            country_code: currency.flag_code(),
            emoji: flag_emoji(currency.flag_code()),
            image_url: flag_url(&self.flag_base_url, currency.code()),
        }
    }

    /// Start a fetch for the current pair, superseding any fetch in flight
    pub fn fetch_exchange_rate(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if !handle.is_finished() {
                tracing::debug!("Aborting superseded rate request #{}", self.generation);
            }
            handle.abort();
        }

        self.generation += 1;
        self.status = FetchStatus::Fetching;

        let generation = self.generation;
        let client = self.client.clone();
        let tx = self.updates_tx.clone();
        let amount = self.amount.clone();
        let (from, to) = (self.from, self.to);

        tracing::info!("Fetching {} -> {} (request #{})", from, to, generation);
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = client.quote(from, to).await;
            let _ = tx.send(RateUpdate {
                generation,
                amount,
                from,
                to,
                outcome,
            });
        }));
    }

    /// Apply any finished fetches without waiting. Returns true if the result changed.
    pub fn poll_updates(&mut self) -> bool {
        // Checked before draining: a task that finished has already sent its update
        let finished = self.in_flight.as_ref().is_some_and(|h| h.is_finished());

        let mut changed = false;
        while let Ok(update) = self.updates_rx.try_recv() {
            changed |= self.apply(update);
        }

        if finished && self.is_fetching() {
            self.fail(format!("rate request #{} ended without a result", self.generation));
            changed = true;
        }
        changed
    }

    /// Wait for the latest fetch to settle. Returns immediately when nothing is in flight.
    pub async fn settle(&mut self) -> Option<&str> {
        while self.is_fetching() {
            let event = match self.in_flight.as_mut() {
                Some(handle) => tokio::select! {
                    biased;
                    update = self.updates_rx.recv() => match update {
                        Some(update) => Settle::Update(update),
                        None => Settle::Closed,
                    },
                    joined = handle => Settle::Joined(joined),
                },
                None => match self.updates_rx.try_recv() {
                    Ok(update) => Settle::Update(update),
                    Err(_) => Settle::Joined(Ok(())),
                },
            };

            match event {
                Settle::Update(update) => {
                    self.apply(update);
                }
                Settle::Joined(Ok(())) => {
                    // Its update, if any, is already queued
                    self.in_flight = None;
                    if let Ok(update) = self.updates_rx.try_recv() {
                        self.apply(update);
                    } else if self.is_fetching() {
                        self.fail(format!("rate request #{} ended without a result", self.generation));
                    }
                }
                Settle::Joined(Err(e)) => {
                    self.fail(format!("rate request #{} failed: {}", self.generation, e));
                }
                Settle::Closed => break,
            }
        }
        self.exchange_rate()
    }

    fn apply(&mut self, update: RateUpdate) -> bool {
        if update.generation != self.generation {
            tracing::debug!(
                "Dropping stale rate response #{} (latest is #{})",
                update.generation,
                self.generation
            );
            return false;
        }

        self.in_flight = None;
        match update.outcome {
            Ok(quote) => {
                self.exchange_rate = Some(format_conversion(
                    &update.amount,
                    update.from.code(),
                    quote.rate,
                    update.to.code(),
                ));
                self.last_updated = quote.last_updated;
                self.status = FetchStatus::Success;
            }
            Err(e) => self.fail(e),
        }
        true
    }

    fn fail(&mut self, reason: impl std::fmt::Display) {
        tracing::error!("Error: {}", reason);
        self.in_flight = None;
        self.exchange_rate = Some(FETCH_ERROR_MESSAGE.to_string());
        self.status = FetchStatus::Error;
    }
}

/// What woke `settle` up
enum Settle {
    Update(RateUpdate),
    Joined(Result<(), JoinError>),
    Closed,
}

impl Drop for ConverterCard {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::DEFAULT_TIMEOUT;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn currency(code: &str) -> Currency {
        Currency::parse(code).unwrap()
    }

    fn card(server: &MockServer, amount: &str, from: &str, to: &str) -> ConverterCard {
        let client =
            RateClient::new(server.url("/v6"), Some("key".to_string()), DEFAULT_TIMEOUT).unwrap();
        ConverterCard::new(client, "https://flags.test", amount, currency(from), currency(to))
    }

    fn rates_body(pairs: &[(&str, f64)]) -> serde_json::Value {
        let rates: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(code, rate)| (code.to_string(), serde_json::json!(rate)))
            .collect();
        serde_json::json!({ "result": "success", "conversion_rates": rates })
    }

    #[tokio::test]
    async fn test_fetch_formats_result() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v6/key/latest/USD");
                then.status(200).json_body(rates_body(&[("KES", 1.25)]));
            })
            .await;

        let mut card = card(&server, "10", "USD", "KES");
        assert_eq!(card.status(), FetchStatus::Idle);
        assert_eq!(card.exchange_rate(), None);

        card.fetch_exchange_rate();
        assert!(card.is_fetching());

        assert_eq!(card.settle().await, Some("10 USD = 12.50 KES"));
        assert_eq!(card.status(), FetchStatus::Success);
        api_mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_non_ok_response_shows_error_string() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v6/key/latest/USD");
                then.status(404);
            })
            .await;

        let mut card = card(&server, "10", "USD", "KES");
        card.fetch_exchange_rate();

        assert_eq!(card.settle().await, Some("Error! Could not retrieve data."));
        assert_eq!(card.status(), FetchStatus::Error);
    }

    #[tokio::test]
    async fn test_each_currency_change_fetches_once() {
        let server = MockServer::start_async().await;
        let eur_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v6/key/latest/EUR");
                then.status(200).json_body(rates_body(&[("KES", 140.0), ("GBP", 0.85)]));
            })
            .await;

        let mut card = card(&server, "1", "USD", "KES");

        assert!(card.set_from_currency("EUR").unwrap());
        card.settle().await;
        eur_mock.assert_hits_async(1).await;

        assert!(card.set_to_currency("GBP").unwrap());
        assert_eq!(card.settle().await, Some("1 EUR = 0.85 GBP"));
        eur_mock.assert_hits_async(2).await;

        // Re-selecting the current value is not a change
        assert!(!card.set_to_currency("GBP").unwrap());
        assert!(!card.is_fetching());
        eur_mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_unsupported_currency_is_rejected() {
        let server = MockServer::start_async().await;
        let mut card = card(&server, "1", "USD", "KES");

        assert!(card.set_from_currency("XXX").is_err());
        assert_eq!(card.from_currency().code(), "USD");
        assert_eq!(card.status(), FetchStatus::Idle);
    }

    #[tokio::test]
    async fn test_swap_refetches_with_new_pair() {
        let server = MockServer::start_async().await;
        let kes_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v6/key/latest/KES");
                then.status(200).json_body(rates_body(&[("USD", 0.008)]));
            })
            .await;

        let mut card = card(&server, "500", "USD", "KES");
        card.handle_swap();

        assert_eq!(card.from_currency().code(), "KES");
        assert_eq!(card.to_currency().code(), "USD");
        assert_eq!(card.settle().await, Some("500 KES = 4.00 USD"));
        kes_mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_swapping_twice_restores_every_pair() {
        // No API key: every fetch fails fast without touching the network
        let client = RateClient::new("http://unused", None, DEFAULT_TIMEOUT).unwrap();
        let mut card = ConverterCard::new(client, "https://flags.test", "1", currency("USD"), currency("KES"));

        for from in Currency::all() {
            for to in [from, from.next()] {
                card.select_from(from);
                card.select_to(to);
                card.handle_swap();
                card.handle_swap();
                assert_eq!((card.from_currency(), card.to_currency()), (from, to));
            }
        }
    }

    #[tokio::test]
    async fn test_latest_request_wins() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v6/key/latest/USD");
                then.status(200)
                    .delay(Duration::from_millis(300))
                    .json_body(rates_body(&[("KES", 100.0)]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v6/key/latest/EUR");
                then.status(200).json_body(rates_body(&[("KES", 200.0)]));
            })
            .await;

        let mut card = card(&server, "1", "USD", "KES");
        card.fetch_exchange_rate();
        card.set_from_currency("EUR").unwrap();

        assert_eq!(card.settle().await, Some("1 EUR = 200.00 KES"));

        tokio::time::sleep(Duration::from_millis(400)).await;
        card.poll_updates();
        assert_eq!(card.exchange_rate(), Some("1 EUR = 200.00 KES"));
    }

    #[tokio::test]
    async fn test_result_uses_amount_at_request_time() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v6/key/latest/USD");
                then.status(200).json_body(rates_body(&[("KES", 2.0)]));
            })
            .await;

        let mut card = card(&server, "3", "USD", "KES");
        card.fetch_exchange_rate();
        card.set_amount("abc9");

        assert_eq!(card.amount(), "9");
        assert_eq!(card.settle().await, Some("3 USD = 6.00 KES"));
    }

    fn offline_card() -> ConverterCard {
        let client = RateClient::new("http://unused", None, DEFAULT_TIMEOUT).unwrap();
        ConverterCard::new(client, "https://flags.test", "1", currency("USD"), currency("KES"))
    }

    /// Put the card in the state a fetch whose task dies before reporting leaves behind
    fn start_dying_fetch(card: &mut ConverterCard) {
        card.generation += 1;
        card.status = FetchStatus::Fetching;
        card.in_flight = Some(tokio::spawn(async {
            panic!("rate task blew up");
        }));
    }

    #[tokio::test]
    async fn test_settle_reports_a_panicked_fetch() {
        let mut card = offline_card();
        start_dying_fetch(&mut card);

        let settled = tokio::time::timeout(Duration::from_secs(5), card.settle())
            .await
            .expect("settle hung on a dead task");

        assert_eq!(settled, Some(FETCH_ERROR_MESSAGE));
        assert_eq!(card.status(), FetchStatus::Error);
        assert!(card.in_flight.is_none());
    }

    #[tokio::test]
    async fn test_poll_reports_a_panicked_fetch() {
        let mut card = offline_card();
        start_dying_fetch(&mut card);

        while !card.in_flight.as_ref().unwrap().is_finished() {
            tokio::task::yield_now().await;
        }

        assert!(card.poll_updates());
        assert_eq!(card.exchange_rate(), Some(FETCH_ERROR_MESSAGE));
        assert_eq!(card.status(), FetchStatus::Error);
    }

    #[tokio::test]
    async fn test_poll_leaves_a_running_fetch_alone() {
        let mut card = offline_card();
        card.generation += 1;
        card.status = FetchStatus::Fetching;
        card.in_flight = Some(tokio::spawn(std::future::pending::<()>()));

        assert!(!card.poll_updates());
        assert!(card.is_fetching());
    }

    #[test]
    fn test_flags_follow_selection() {
        let client = RateClient::new("http://unused", None, DEFAULT_TIMEOUT).unwrap();
        let card = ConverterCard::new(client, "https://flags.test", "1", currency("USD"), currency("KES"));

        let from = card.from_flag();
        assert_eq!(from.country_code, "US");
        assert_eq!(from.emoji.as_deref(), Some("🇺🇸"));
        assert_eq!(from.image_url.as_deref(), Some("https://flags.test/US/shiny/64.png"));
        assert_eq!(card.to_flag().country_code, "KE");
    }

    #[test]
    fn test_amount_editing() {
        let client = RateClient::new("http://unused", None, DEFAULT_TIMEOUT).unwrap();
        let mut card = ConverterCard::new(client, "https://flags.test", "1x0", currency("USD"), currency("KES"));

        assert_eq!(card.amount(), "10");
        assert!(card.push_amount_char('.'));
        assert!(!card.push_amount_char('.'));
        assert!(card.push_amount_char('5'));
        assert!(!card.push_amount_char('a'));
        assert_eq!(card.amount(), "10.5");
        card.pop_amount_char();
        assert_eq!(card.amount(), "10.");
        assert_eq!(card.status(), FetchStatus::Idle);
    }
}
