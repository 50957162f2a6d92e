//! W3C WebDriver adapter.
//!
//! Talks to a WebDriver endpoint (chromedriver, geckodriver or a Selenium
//! grid) over plain HTTP. Page structure is read through one selector
//! table, `SELECTORS`; bulk extraction runs as a single script per page so
//! a league page costs one round trip rather than one per element.
//!
//! Protocol: https://www.w3.org/TR/webdriver2/

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::{CompletedRow, Credentials, LoginStatus, PricePoint, Scraper, Session, Submission};
use crate::config::SiteConfig;
use crate::types::{Fixture, PriceIndex, PricePoints, RunContext};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const LINE_PATH: &str = "/line/Football/";
const RESULTS_PATH: &str = "/results/";

/// Fragment of the URL the site redirects to when it wants the account
/// verified.
const VERIFY_MARKER: &str = "accountverify";

/// Label of the football tab on the results page.
const FOOTBALL_LABEL: &str = "Футбол";

/// Key of an element reference in WebDriver JSON.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Time the site takes to redirect after the login form is submitted.
const LOGIN_SETTLE: Duration = Duration::from_millis(1500);

/// CSS selectors for every element the adapter touches.
#[derive(Debug, Clone, Copy)]
pub struct Selectors {
    pub league_link: &'static str,
    pub league_title: &'static str,
    pub fixture_row: &'static str,
    pub fixture_time: &'static str,
    pub fixture_team: &'static str,
    pub price: &'static str,
    pub auth_open: &'static str,
    pub auth_input: &'static str,
    pub auth_submit: &'static str,
    pub balance: &'static str,
    pub stake_input: &'static str,
    pub stake_submit: &'static str,
    pub stake_confirm: &'static str,
    pub rejection_text: &'static str,
    pub rejection_confirm: &'static str,
    pub slip_delete: &'static str,
    pub results_nav: &'static str,
    pub results_filter: &'static str,
    pub datepicker: &'static str,
    pub datepicker_prev: &'static str,
    pub datepicker_day: &'static str,
    pub results_row: &'static str,
    pub results_date: &'static str,
    pub results_teams: &'static str,
    pub results_score: &'static str,
}

pub const SELECTORS: Selectors = Selectors {
    league_link: ".liga_menu a[href*='/line/Football/']",
    league_title: ".c-events__liga",
    fixture_row: ".c-events__item_game",
    fixture_time: ".c-events__time span",
    fixture_team: ".c-events__team",
    price: ".c-bets__bet",
    auth_open: ".base_auth_form",
    auth_input: ".c-input-material__input",
    auth_submit: ".auth-button",
    balance: ".top-b-acc__amount",
    stake_input: ".bet_sum_input",
    stake_submit: ".coupon-btn-group__item button",
    stake_confirm: ".o-btn-group__item button",
    rejection_text: ".swal2-content",
    rejection_confirm: ".swal2-confirm",
    slip_delete: ".c-bet-box__del",
    results_nav: ".c-nav__link",
    results_filter: ".c-filter_filled",
    datepicker: ".vdp-datepicker",
    datepicker_prev: ".vdp-datepicker .prev",
    datepicker_day: ".vdp-datepicker .day",
    results_row: ".c-games__row_can-toggle",
    results_date: ".c-games__date",
    results_teams: ".c-games__opponents",
    results_score: ".c-games__results",
};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

/// Rows as returned by the fixture extraction script.
#[derive(Debug, Deserialize)]
struct RawLeaguePage {
    league: Option<String>,
    rows: Vec<RawFixtureRow>,
}

#[derive(Debug, Deserialize)]
struct RawFixtureRow {
    time: String,
    teams: Vec<String>,
    prices: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawResultRow {
    date: String,
    teams: String,
    score: String,
}

const LEAGUE_LINKS_SCRIPT: &str = r#"
return Array.from(document.querySelectorAll(arguments[0]))
    .map(a => a.getAttribute('href'))
    .filter(h => h);
"#;

const FIXTURES_SCRIPT: &str = r#"
const [row, time, team, price, league] = arguments;
const text = (el) => el ? el.textContent.trim() : '';
const title = document.querySelector(league);
return {
    league: title ? text(title) : null,
    rows: Array.from(document.querySelectorAll(row)).map(r => ({
        time: text(r.querySelector(time)),
        teams: Array.from(r.querySelectorAll(team)).map(text),
        prices: Array.from(r.querySelectorAll(price)).map(text),
    })),
};
"#;

const RESULTS_SCRIPT: &str = r#"
const [row, date, teams, score] = arguments;
const text = (el) => el ? el.textContent.trim() : '';
return Array.from(document.querySelectorAll(row)).map(r => ({
    date: text(r.querySelector(date)),
    teams: text(r.querySelector(teams)),
    score: text(r.querySelector(score)),
}));
"#;

// ---------------------------------------------------------------------------
// Driver errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
enum DriverError {
    #[error("WebDriver request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver {error}: {message}")]
    Command { error: String, message: String },

    #[error("Timed out waiting for `{0}`")]
    Timeout(String),

    #[error("Malformed WebDriver response: {0}")]
    Protocol(String),
}

impl DriverError {
    fn is_stale(&self) -> bool {
        matches!(self, DriverError::Command { error, .. } if error == "stale element reference")
    }
}

/// Unwrap a WebDriver response body.
fn decode(success: bool, body: &str) -> Result<Value, DriverError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| DriverError::Protocol(format!("{e}: {body}")))?;
    if success {
        return Ok(envelope.value);
    }
    let wire: WireError = serde_json::from_value(envelope.value)
        .map_err(|e| DriverError::Protocol(format!("{e}: {body}")))?;
    Err(DriverError::Command {
        error: wire.error,
        message: wire.message,
    })
}

fn element_ids(value: Value) -> Result<Vec<String>, DriverError> {
    let refs: Vec<HashMap<String, String>> =
        serde_json::from_value(value).map_err(|e| DriverError::Protocol(e.to_string()))?;
    refs.into_iter()
        .map(|mut r| {
            r.remove(ELEMENT_KEY)
                .ok_or_else(|| DriverError::Protocol("element reference without id".into()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// One WebDriver session.
struct Driver {
    http: Client,
    endpoint: String,
    session_id: String,
    timeout: Duration,
}

impl Driver {
    async fn start(
        http: &Client,
        endpoint: &str,
        headless: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let mut args = vec!["--window-size=1600,1000"];
        if headless {
            args.push("--headless=new");
        }
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args },
                }
            }
        });

        let resp = http
            .post(format!("{endpoint}/session"))
            .json(&body)
            .send()
            .await
            .context("WebDriver session request failed")?;
        let success = resp.status().is_success();
        let text = resp.text().await.context("Failed to read WebDriver response")?;
        let value = decode(success, &text)?;
        let session: NewSession =
            serde_json::from_value(value).context("Failed to parse WebDriver session")?;

        debug!(session = %session.session_id, headless, "WebDriver session started");
        Ok(Self {
            http: http.clone(),
            endpoint: endpoint.to_string(),
            session_id: session.session_id,
            timeout,
        })
    }

    async fn command(&self, method: Method, path: &str, body: Value) -> Result<Value, DriverError> {
        let url = format!("{}/session/{}{}", self.endpoint, self.session_id, path);
        let mut req = self.http.request(method.clone(), &url);
        if method == Method::POST {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let success = resp.status().is_success();
        let text = resp.text().await?;
        decode(success, &text)
    }

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        debug!(url, "Navigating");
        self.command(Method::POST, "/url", json!({ "url": url })).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let value = self.command(Method::GET, "/url", Value::Null).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::Protocol("url is not a string".into()))
    }

    async fn find_all(&self, css: &str) -> Result<Vec<String>, DriverError> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                json!({ "using": "css selector", "value": css }),
            )
            .await?;
        element_ids(value)
    }

    async fn find_within(&self, element: &str, css: &str) -> Result<Vec<String>, DriverError> {
        let value = self
            .command(
                Method::POST,
                &format!("/element/{element}/elements"),
                json!({ "using": "css selector", "value": css }),
            )
            .await?;
        element_ids(value)
    }

    async fn text(&self, element: &str) -> Result<String, DriverError> {
        let value = self
            .command(Method::GET, &format!("/element/{element}/text"), Value::Null)
            .await?;
        Ok(value.as_str().unwrap_or_default().trim().to_string())
    }

    async fn click(&self, element: &str) -> Result<(), DriverError> {
        self.command(Method::POST, &format!("/element/{element}/click"), json!({}))
            .await?;
        Ok(())
    }

    /// Click through script, for buttons the page overlays.
    async fn script_click(&self, element: &str) -> Result<(), DriverError> {
        self.execute::<Value>("arguments[0].click();", vec![json!({ ELEMENT_KEY: element })])
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &str, text: &str) -> Result<(), DriverError> {
        self.command(
            Method::POST,
            &format!("/element/{element}/value"),
            json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        script: &str,
        args: Vec<Value>,
    ) -> Result<T, DriverError> {
        let value = self
            .command(
                Method::POST,
                "/execute/sync",
                json!({ "script": script, "args": args }),
            )
            .await?;
        serde_json::from_value(value).map_err(|e| DriverError::Protocol(e.to_string()))
    }

    /// Poll until `css` matches at least one element. Stale references
    /// during re-render are retried; the timeout is a fault.
    async fn wait_all(&self, css: &str) -> Result<Vec<String>, DriverError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match self.find_all(css).await {
                Ok(found) if !found.is_empty() => return Ok(found),
                Ok(_) => {}
                Err(e) if e.is_stale() => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(css.to_string()));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_one(&self, css: &str) -> Result<String, DriverError> {
        let mut found = self.wait_all(css).await?;
        Ok(found.swap_remove(0))
    }

    async fn quit(&self) -> Result<()> {
        self.http
            .delete(format!("{}/session/{}", self.endpoint, self.session_id))
            .send()
            .await
            .context("WebDriver session delete failed")?;
        debug!(session = %self.session_id, "WebDriver session closed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Text parsing
// ---------------------------------------------------------------------------

/// League path relative to the football line, from an anchor href.
pub fn league_path(href: &str) -> Option<String> {
    let (_, tail) = href.split_once(LINE_PATH)?;
    let path = tail.trim_matches('/');
    (!path.is_empty()).then(|| path.to_string())
}

/// Parse a listed price. The site renders a dash for a closed market.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return None;
    }
    Decimal::from_str(text).ok()
}

/// Parse an account balance such as `"1 234,50"`.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let normalised: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&normalised).ok()
}

/// Parse a listing time such as `"19.10 21:00"` in the given year.
pub fn parse_listing_time(text: &str, year: i32) -> Option<NaiveDateTime> {
    let mut parts = text.split_whitespace();
    let day_month = parts.next()?;
    let time = parts.next()?;
    NaiveDateTime::parse_from_str(&format!("{day_month}.{year} {time}"), "%d.%m.%Y %H:%M").ok()
}

/// Listing time of an upcoming fixture. The line omits the year, so a
/// date that would lie well in the past belongs to next year.
pub fn parse_upcoming_time(text: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    let parsed = parse_listing_time(text, today.year())?;
    if parsed.date() < today - ChronoDuration::days(1) {
        return parse_listing_time(text, today.year() + 1);
    }
    Some(parsed)
}

fn fixture_from_row(
    row: RawFixtureRow,
    league: &str,
    league_link: &str,
    today: NaiveDate,
) -> Option<Fixture> {
    let date_time = parse_upcoming_time(&row.time, today)?;
    let [first_team, second_team] = <[String; 2]>::try_from(row.teams).ok()?;
    let price = |index: PriceIndex| row.prices.get(index.position()).and_then(|p| parse_price(p));

    Some(Fixture {
        league: league.to_string(),
        league_link: league_link.to_string(),
        date_time,
        first_team,
        second_team,
        prices: PricePoints {
            first_win: price(PriceIndex::FirstWin),
            tie: price(PriceIndex::Tie),
            second_win: price(PriceIndex::SecondWin),
            first_win_or_tie: price(PriceIndex::FirstWinOrTie),
            second_win_or_tie: price(PriceIndex::SecondWinOrTie),
        },
    })
}

/// Months the results date picker has to step back from `today` to show
/// `date`.
fn months_back(today: NaiveDate, date: NaiveDate) -> u32 {
    let months = |d: NaiveDate| d.year() * 12 + d.month0() as i32;
    (months(today) - months(date)).max(0) as u32
}

// ---------------------------------------------------------------------------
// Site
// ---------------------------------------------------------------------------

/// The betting site, reached through a WebDriver endpoint.
pub struct WebDriverSite {
    http: Client,
    base_url: String,
    webdriver_url: String,
    headless: bool,
    wait_timeout: Duration,
    /// Run date: listing years are inferred and the results date picker
    /// is stepped relative to it.
    today: NaiveDate,
}

impl WebDriverSite {
    pub fn new(cfg: &SiteConfig, ctx: &RunContext) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client for WebDriver")?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            webdriver_url: cfg.webdriver_url.trim_end_matches('/').to_string(),
            headless: cfg.headless,
            wait_timeout: Duration::from_secs(cfg.wait_timeout_secs),
            today: ctx.today(),
        })
    }

    async fn start(&self, headless: bool) -> Result<Driver> {
        Driver::start(&self.http, &self.webdriver_url, headless, self.wait_timeout).await
    }

    fn line_url(&self, league_link: &str) -> String {
        format!("{}{}{}", self.base_url, LINE_PATH, league_link)
    }

    async fn read_league_links(&self, driver: &Driver) -> Result<Vec<String>> {
        driver.navigate(&self.line_url("")).await?;
        driver.wait_all(SELECTORS.league_link).await?;
        let hrefs: Vec<String> = driver
            .execute(LEAGUE_LINKS_SCRIPT, vec![json!(SELECTORS.league_link)])
            .await?;

        let mut links: Vec<String> = hrefs.iter().filter_map(|h| league_path(h)).collect();
        links.sort();
        links.dedup();
        Ok(links)
    }

    async fn read_fixtures(&self, driver: &Driver, league_link: &str) -> Result<Vec<Fixture>> {
        driver.navigate(&self.line_url(league_link)).await?;
        driver.wait_all(SELECTORS.fixture_row).await?;
        let page: RawLeaguePage = driver
            .execute(
                FIXTURES_SCRIPT,
                vec![
                    json!(SELECTORS.fixture_row),
                    json!(SELECTORS.fixture_time),
                    json!(SELECTORS.fixture_team),
                    json!(SELECTORS.price),
                    json!(SELECTORS.league_title),
                ],
            )
            .await?;

        let league = page.league.unwrap_or_else(|| league_link.to_string());
        let today = self.today;
        let listed = page.rows.len();
        let fixtures: Vec<Fixture> = page
            .rows
            .into_iter()
            .filter_map(|row| fixture_from_row(row, &league, league_link, today))
            .collect();
        if fixtures.len() < listed {
            debug!(
                league = %league_link,
                skipped = listed - fixtures.len(),
                "Unparseable fixture rows skipped"
            );
        }
        Ok(fixtures)
    }
}

#[async_trait]
impl Scraper for WebDriverSite {
    async fn fetch_league_links(&self) -> Result<Vec<String>> {
        let driver = self.start(true).await?;
        let result = self.read_league_links(&driver).await;
        if let Err(e) = driver.quit().await {
            warn!(error = %e, "Failed to close scraping session");
        }
        result.context("Failed to read league links")
    }

    async fn fetch_fixtures(&self, league_link: &str) -> Result<Vec<Fixture>> {
        let driver = self.start(true).await?;
        let result = self.read_fixtures(&driver, league_link).await;
        if let Err(e) = driver.quit().await {
            warn!(error = %e, "Failed to close scraping session");
        }
        result.with_context(|| format!("Failed to read fixtures of {league_link}"))
    }

    async fn open_session(&self) -> Result<Box<dyn Session>> {
        let driver = self.start(self.headless).await?;
        info!(headless = self.headless, "Site session opened");
        Ok(Box::new(WebDriverSession {
            driver,
            base_url: self.base_url.clone(),
            today: self.today,
            closed: false,
        }))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct WebDriverSession {
    driver: Driver,
    base_url: String,
    today: NaiveDate,
    closed: bool,
}

impl WebDriverSession {
    async fn open_results_day(&self, date: NaiveDate) -> Result<()> {
        let d = &self.driver;
        d.navigate(&format!("{}{}", self.base_url, RESULTS_PATH)).await?;

        let mut football = None;
        for link in d.wait_all(SELECTORS.results_nav).await? {
            if d.text(&link).await?.contains(FOOTBALL_LABEL) {
                football = Some(link);
                break;
            }
        }
        let football = football.ok_or_else(|| anyhow!("Football tab not found on results page"))?;
        d.click(&football).await?;
        let filter = d.wait_one(SELECTORS.results_filter).await?;
        d.click(&filter).await?;

        let picker = d.wait_one(SELECTORS.datepicker).await?;
        d.click(&picker).await?;
        for _ in 0..months_back(self.today, date) {
            let prev = d.wait_one(SELECTORS.datepicker_prev).await?;
            d.script_click(&prev).await?;
        }

        let wanted = date.day().to_string();
        for day in d.wait_all(SELECTORS.datepicker_day).await? {
            if d.text(&day).await? == wanted {
                d.click(&day).await?;
                return Ok(());
            }
        }
        Err(anyhow!("Day {date} not found in results date picker"))
    }
}

#[async_trait]
impl Session for WebDriverSession {
    async fn authenticate(&mut self, credentials: &Credentials) -> Result<LoginStatus> {
        let d = &self.driver;
        d.navigate(&format!("{}/", self.base_url)).await?;

        let open = d.wait_one(SELECTORS.auth_open).await?;
        d.click(&open).await?;
        let inputs = d.wait_all(SELECTORS.auth_input).await?;
        if inputs.len() < 2 {
            bail!("Login form has {} inputs, expected 2", inputs.len());
        }
        d.send_keys(&inputs[0], &credentials.login).await?;
        d.send_keys(&inputs[1], credentials.password.expose_secret())
            .await?;
        let submit = d.wait_one(SELECTORS.auth_submit).await?;
        d.click(&submit).await?;

        sleep(LOGIN_SETTLE).await;
        let url = d.current_url().await?;
        if url.contains(VERIFY_MARKER) {
            return Ok(LoginStatus::VerificationRequired);
        }
        info!(login = %credentials.login, "Logged in");
        Ok(LoginStatus::LoggedIn)
    }

    async fn balance(&mut self) -> Result<Decimal> {
        let el = self.driver.wait_one(SELECTORS.balance).await?;
        let text = self.driver.text(&el).await?;
        parse_amount(&text).ok_or_else(|| anyhow!("Unreadable balance: {text:?}"))
    }

    async fn locate_price_points(&mut self, fixture: &Fixture) -> Result<Vec<PricePoint>> {
        let d = &self.driver;
        d.navigate(&format!("{}{}{}", self.base_url, LINE_PATH, fixture.league_link))
            .await?;

        for row in d.wait_all(SELECTORS.fixture_row).await? {
            let times = d.find_within(&row, SELECTORS.fixture_time).await?;
            let Some(time) = times.first() else {
                continue;
            };
            let listed = parse_listing_time(&d.text(time).await?, fixture.date_time.year());
            if listed != Some(fixture.date_time) {
                continue;
            }

            let teams = d.find_within(&row, SELECTORS.fixture_team).await?;
            if teams.len() < 2
                || d.text(&teams[0]).await? != fixture.first_team
                || d.text(&teams[1]).await? != fixture.second_team
            {
                continue;
            }

            let mut points = Vec::new();
            let elements = d.find_within(&row, SELECTORS.price).await?;
            for (index, element) in PriceIndex::ALL.iter().zip(elements) {
                let price = parse_price(&d.text(&element).await?);
                points.push(PricePoint {
                    index: *index,
                    element,
                    price,
                });
            }
            return Ok(points);
        }

        Ok(Vec::new())
    }

    async fn submit_stake(&mut self, point: &PricePoint, amount: Decimal) -> Result<Submission> {
        let d = &self.driver;
        d.click(&point.element).await?;
        let input = d.wait_one(SELECTORS.stake_input).await?;
        d.send_keys(&input, &amount.to_string()).await?;
        let submit = d.wait_one(SELECTORS.stake_submit).await?;
        d.script_click(&submit).await?;

        match d.wait_one(SELECTORS.stake_confirm).await {
            Ok(ok) => {
                d.script_click(&ok).await?;
                Ok(Submission::Confirmed)
            }
            Err(DriverError::Timeout(_)) => {
                let reason = match d.find_all(SELECTORS.rejection_text).await?.first() {
                    Some(el) => d.text(el).await?,
                    None => String::new(),
                };
                let reason = if reason.is_empty() {
                    "Bet not confirmed".to_string()
                } else {
                    reason
                };
                Ok(Submission::Rejected(reason))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn dismiss_rejection(&mut self) -> Result<()> {
        let d = &self.driver;
        let confirm = d.wait_one(SELECTORS.rejection_confirm).await?;
        d.script_click(&confirm).await?;
        let delete = d.wait_one(SELECTORS.slip_delete).await?;
        d.script_click(&delete).await?;
        Ok(())
    }

    async fn fetch_completed(&mut self, date: NaiveDate) -> Result<Vec<CompletedRow>> {
        self.open_results_day(date).await?;
        self.driver.wait_all(SELECTORS.results_row).await?;
        let raw: Vec<RawResultRow> = self
            .driver
            .execute(
                RESULTS_SCRIPT,
                vec![
                    json!(SELECTORS.results_row),
                    json!(SELECTORS.results_date),
                    json!(SELECTORS.results_teams),
                    json!(SELECTORS.results_score),
                ],
            )
            .await?;

        let listed = raw.len();
        let rows: Vec<CompletedRow> = raw
            .into_iter()
            .filter_map(|r| {
                Some(CompletedRow {
                    date_time: parse_listing_time(&r.date, date.year())?,
                    teams: r.teams,
                    score: r.score,
                })
            })
            .collect();
        debug!(date = %date, listed, parsed = rows.len(), "Results listing read");
        Ok(rows)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.driver.quit().await
    }
}
