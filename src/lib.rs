//! fxcard: a terminal currency converter card backed by a live exchange-rate API

pub mod app;
pub mod card;
pub mod config;
pub mod currency;
pub mod exchange;
pub mod theme;
pub mod ui;
