//! Betting site integration.
//!
//! Defines the `Scraper` and `Session` traits the engine drives and
//! provides a W3C WebDriver implementation in `webdriver`. Everything the
//! engine knows about the site passes through these two traits.

pub mod webdriver;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use secrecy::SecretString;

use crate::types::{Fixture, PriceIndex};

pub use webdriver::WebDriverSite;

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// Site login.
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Result of an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    LoggedIn,
    /// The site redirected to an account verification page. Betting may
    /// still work, so the run continues.
    VerificationRequired,
}

/// A clickable price element located on the live line page.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub index: PriceIndex,
    /// Opaque element reference understood by the session that produced it.
    pub element: String,
    pub price: Option<Decimal>,
}

/// What the site answered to a stake submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Confirmed,
    Rejected(String),
}

/// One raw row of the completed-results listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRow {
    pub date_time: NaiveDateTime,
    /// Both team names as displayed, e.g. `"Real Madrid B - Barcelona B"`.
    pub teams: String,
    /// Score as displayed, e.g. `"2:2 (1:1)"`.
    pub score: String,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read-only access to the football line.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Links of every league currently listed on the football line.
    async fn fetch_league_links(&self) -> Result<Vec<String>>;

    /// Fixtures (with prices) listed on one league page.
    async fn fetch_fixtures(&self, league_link: &str) -> Result<Vec<Fixture>>;

    /// Start an interactive browser session.
    async fn open_session(&self) -> Result<Box<dyn Session>>;
}

/// An interactive session against the site.
///
/// Sessions are used sequentially by one stage at a time. Every error
/// returned here is a session fault and ends the stage.
#[async_trait]
pub trait Session: Send {
    async fn authenticate(&mut self, credentials: &Credentials) -> Result<LoginStatus>;

    /// Current account balance.
    async fn balance(&mut self) -> Result<Decimal>;

    /// Price elements of `fixture` on its league page. Empty if the fixture
    /// is no longer listed.
    async fn locate_price_points(&mut self, fixture: &Fixture) -> Result<Vec<PricePoint>>;

    async fn submit_stake(&mut self, point: &PricePoint, amount: Decimal) -> Result<Submission>;

    /// Confirm the rejection dialog and clear the bet slip.
    async fn dismiss_rejection(&mut self) -> Result<()>;

    /// Completed fixtures listed for `date`, in listing order.
    async fn fetch_completed(&mut self, date: NaiveDate) -> Result<Vec<CompletedRow>>;

    async fn close(&mut self) -> Result<()>;
}
