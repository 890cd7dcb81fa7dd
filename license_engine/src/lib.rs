//! License Engine library crate.
//!
//! This crate normalises heterogeneous subscription billing records
//! (currencies, billing cycles, pricing models) into comparable
//! monthly JPY figures and usage rates.  Applications may call the
//! pure functions in [`billing`], [`currency`], [`usage`] and [`cost`]
//! directly, go through [`engine::CostEngine`], or embed the HTTP API
//! via `api::build_router`.

pub mod api;
pub mod billing;
pub mod config;
pub mod cost;
pub mod currency;
pub mod engine;
pub mod error;
pub mod models;
pub mod usage;
