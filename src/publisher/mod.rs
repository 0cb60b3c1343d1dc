use std::fmt;
use std::fmt::{Display, Formatter};
use std::thread;
use std::time::{Duration, Instant};

use spdlog::{debug, error, info, warn};

use crate::automation::retry::RetryPolicy;
use crate::automation::wait::Waiter;
use crate::automation::webdriver::WebDriverBrowser;
use crate::automation::{click_with_fallback, safe_click, Browser, Locator, UiError, UiResult};
use crate::config::{Config, Site};
use crate::post::PostDescriptor;
use crate::publisher::publish::PublishResult;
use crate::publisher::selectors::*;

pub mod media;
pub mod publish;
pub mod selectors;
pub mod taxonomy;

/// Where the publisher is in its session. Only moves forward, except that
/// every new post starts over at `PostFormOpen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowState {
    Idle,
    BrowserReady,
    LoggedIn,
    PostFormOpen,
    ContentSet,
    MediaSet,
    CategorySet,
    TagsSet,
    PublishAttempted,
    Published,
    DraftSaved,
    Failed,
}

/// Steps whose failure does not fail the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    TextMode,
    VisualMode,
    FeaturedImage,
    Category,
    Tags,
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::TextMode => "switch to text mode",
            Step::VisualMode => "switch to visual mode",
            Step::FeaturedImage => "set featured image",
            Step::Category => "set category",
            Step::Tags => "set tags",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    SkippedNotApplicable,
    FailedNonFatal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Result of one post. Fatal session errors are not outcomes, they are
/// returned as errors by `create_post`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub reason: Option<String>,
    pub steps: Vec<StepRecord>,
}

impl Outcome {
    fn succeeded(steps: Vec<StepRecord>) -> Outcome {
        Outcome { success: true, reason: None, steps }
    }

    fn failed(reason: String, steps: Vec<StepRecord>) -> Outcome {
        Outcome { success: false, reason: Some(reason), steps }
    }

    pub fn step(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.outcome)
    }
}

/// Fixed delays that let the admin UI catch up.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub settle: Duration,
    pub step: Duration,
    pub short: Duration,
    pub publish_wait: Duration,
    pub retry_backoff: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            settle: Duration::from_secs(2),
            step: Duration::from_secs(1),
            short: Duration::from_millis(500),
            publish_wait: Duration::from_secs(3),
            retry_backoff: Duration::from_secs(2),
        }
    }
}

impl Pacing {
    pub fn none() -> Pacing {
        Pacing {
            settle: Duration::ZERO,
            step: Duration::ZERO,
            short: Duration::ZERO,
            publish_wait: Duration::ZERO,
            retry_backoff: Duration::ZERO,
        }
    }
}

pub struct Publisher<B: Browser> {
    browser: B,
    site: Site,
    waiter: Waiter,
    pacing: Pacing,
    state: WorkflowState,
}

/// Starts the browser session. A failure here is never retried.
pub fn setup_browser(config: &Config) -> UiResult<Publisher<WebDriverBrowser>> {
    let browser = WebDriverBrowser::start(&config.browser)?;
    let waiter = Waiter::new(Duration::from_secs(config.browser.page_load_timeout_secs));
    Ok(Publisher::new(browser, config.site.clone(), waiter, Pacing::default()))
}

fn timed<T>(action: &str, op: impl FnOnce() -> UiResult<T>) -> UiResult<T> {
    info!("Starting: {}", action);
    let start = Instant::now();
    let result = op();
    match &result {
        Ok(_) => info!("Completed: {} (Duration: {:.2} seconds)", action, start.elapsed().as_secs_f64()),
        Err(e) => error!("Failed: {} after {:.2} seconds: {}", action, start.elapsed().as_secs_f64(), e),
    }
    result
}

impl<B: Browser> Publisher<B> {
    pub fn new(browser: B, site: Site, waiter: Waiter, pacing: Pacing) -> Publisher<B> {
        Publisher {
            browser,
            site,
            waiter,
            pacing,
            state: WorkflowState::BrowserReady,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    fn advance(&mut self, next: WorkflowState) {
        if next > self.state || next == WorkflowState::PostFormOpen {
            debug!("Workflow state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    pub fn login(&mut self) -> bool {
        let result = timed("login", || self.try_login());
        match result {
            Ok(()) => {
                self.advance(WorkflowState::LoggedIn);
                true
            }
            Err(_) => false,
        }
    }

    fn try_login(&mut self) -> UiResult<()> {
        self.browser.navigate(&self.site.admin_url())?;
        let username = self.site.username.clone();
        let password = self.site.password.clone();
        self.fill_field(USER_LOGIN, &username)?;
        self.fill_field(USER_PASS, &password)?;

        let submit = self.waiter.until_clickable(&mut self.browser, &Locator::id(LOGIN_SUBMIT))?;
        click_with_fallback(&mut self.browser, &submit)?;
        self.waiter.until_present(&mut self.browser, &Locator::id(ADMIN_BAR))?;
        Ok(())
    }

    /// Fills and submits one post. Only a dead browser session is an `Err`;
    /// any other failure is reported in the outcome.
    pub fn create_post(&mut self, post: &PostDescriptor) -> Result<Outcome, UiError> {
        let action = format!("create post '{}'", post.title());
        let mut steps = Vec::new();

        match timed(&action, || self.fill_and_submit(post, &mut steps)) {
            Ok(()) => Ok(Outcome::succeeded(steps)),
            Err(e) => {
                self.advance(WorkflowState::Failed);
                if e.is_fatal() {
                    return Err(e);
                }
                Ok(Outcome::failed(e.to_string(), steps))
            }
        }
    }

    fn fill_and_submit(&mut self, post: &PostDescriptor, steps: &mut Vec<StepRecord>) -> UiResult<()> {
        self.browser.navigate(&self.site.new_post_url())?;
        self.pause(self.pacing.settle);
        self.advance(WorkflowState::PostFormOpen);

        self.fill_field(TITLE, post.title())?;
        steps.push(self.optional_step(Step::TextMode, |p| p.switch_editor(TEXT_MODE))?);
        self.fill_field(CONTENT, post.content())?;
        steps.push(self.optional_step(Step::VisualMode, |p| p.switch_editor(VISUAL_MODE))?);
        self.advance(WorkflowState::ContentSet);

        let media = match post.media_index() {
            Some(index) => self.optional_step(Step::FeaturedImage, |p| p.set_featured_image(index))?,
            None => StepRecord { step: Step::FeaturedImage, outcome: StepOutcome::SkippedNotApplicable },
        };
        if media.outcome == StepOutcome::Applied {
            self.advance(WorkflowState::MediaSet);
        }
        steps.push(media);

        let category = match post.category() {
            Some(category) => self.optional_step(Step::Category, |p| p.set_category(category))?,
            None => StepRecord { step: Step::Category, outcome: StepOutcome::SkippedNotApplicable },
        };
        if category.outcome == StepOutcome::Applied {
            self.advance(WorkflowState::CategorySet);
        }
        steps.push(category);

        let tags = match post.tags() {
            Some(tags) => self.optional_step(Step::Tags, |p| p.set_tags(tags))?,
            None => StepRecord { step: Step::Tags, outcome: StepOutcome::SkippedNotApplicable },
        };
        if tags.outcome == StepOutcome::Applied {
            self.advance(WorkflowState::TagsSet);
        }
        steps.push(tags);

        self.advance(WorkflowState::PublishAttempted);
        match self.publish_post(post.status())? {
            PublishResult::Published { .. } | PublishResult::AlreadyPublished => {
                if !self.is_post_published() {
                    return Err(UiError::Unverified("Post was not published".to_string()));
                }
                self.advance(WorkflowState::Published);
            }
            PublishResult::Saved { .. } => self.advance(WorkflowState::DraftSaved),
        }

        Ok(())
    }

    /// Runs a step whose failure is only logged. A fatal error still ends the post.
    fn optional_step<F>(&mut self, step: Step, op: F) -> UiResult<StepRecord>
        where F: FnOnce(&mut Self) -> UiResult<()> {
        let outcome = match op(self) {
            Ok(()) => StepOutcome::Applied,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Failed to {}: {}", step, e);
                StepOutcome::FailedNonFatal(e.to_string())
            }
        };
        Ok(StepRecord { step, outcome })
    }

    fn fill_field(&mut self, id: &str, text: &str) -> UiResult<()> {
        let field = self.waiter.until_present(&mut self.browser, &Locator::id(id))?;
        self.browser.clear(&field)?;
        self.browser.send_keys(&field, text)
    }

    fn switch_editor(&mut self, tab: &str) -> UiResult<()> {
        self.safe_click(&Locator::id(tab))?;
        self.pause(self.pacing.step);
        Ok(())
    }

    fn safe_click(&mut self, locator: &Locator) -> UiResult<()> {
        let policy = RetryPolicy::clicks().with_delay(self.pacing.step);
        safe_click(&mut self.browser, &self.waiter, locator, &policy)
    }

    /// Closes the browser. Consumes the publisher so this happens once.
    pub fn cleanup(mut self) {
        match self.browser.quit() {
            Ok(()) => info!("Browser closed"),
            Err(e) => warn!("Error closing browser: {}", e),
        }
    }
}
