// Copyright 2026 Scout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scout runtime library: adaptive login and page-structure extraction.
//!
//! [`explorer::Explorer`] is the entry point. It opens one browser session
//! per URL, authenticates with the strategy the inputs call for, and returns
//! an importance-ranked [`extract::types::PageRecord`] of the page.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod explorer;
pub mod extract;
pub mod keywords;
pub mod locate;
pub mod recognition;
pub mod renderer;
pub mod session;

pub use error::{ScoutError, ScoutResult};
pub use explorer::{ExploreRequest, ExplorationOutcome, Explorer};
