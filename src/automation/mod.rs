use std::fmt;
use std::fmt::{Display, Formatter};

use serde_json::Value;
use spdlog::debug;
use thiserror::Error;

use crate::automation::retry::RetryPolicy;
use crate::automation::wait::Waiter;

pub mod retry;
pub mod wait;
pub mod webdriver;

#[cfg(test)]
pub mod fake;

/// WebDriver key code for Return.
pub const KEY_RETURN: &str = "\u{E006}";

pub const CLICK_SCRIPT: &str = "arguments[0].click();";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UiError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Stale element reference: {0}")]
    StaleElement(String),
    #[error("Click intercepted: {0}")]
    ClickIntercepted(String),
    #[error("Operation timed out: {0}")]
    Timeout(String),
    /// The action ran but its effect never showed up on the page.
    #[error("{0}")]
    Unverified(String),
    #[error("Browser command failed: {0}")]
    Command(String),
    #[error("Browser session error: {0}")]
    Session(String),
}

impl UiError {
    /// Errors a flaky page produces; worth another try.
    pub fn is_transient(&self) -> bool {
        matches!(self,
            UiError::ElementNotFound(_) | UiError::StaleElement(_) | UiError::ClickIntercepted(_) | UiError::Timeout(_))
    }

    /// The browser is gone; nothing else will work.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UiError::Session(_))
    }
}

pub type UiResult<T> = Result<T, UiError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Id(String),
    Css(String),
    ClassName(String),
    XPath(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Locator {
        Locator::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Locator {
        Locator::Css(selector.into())
    }

    pub fn class_name(class: impl Into<String>) -> Locator {
        Locator::ClassName(class.into())
    }

    pub fn xpath(xpath: impl Into<String>) -> Locator {
        Locator::XPath(xpath.into())
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Css(css) => write!(f, "{}", css),
            Locator::ClassName(class) => write!(f, ".{}", class),
            Locator::XPath(xpath) => write!(f, "xpath:{}", xpath),
        }
    }
}

/// Opaque reference to an element of the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element(pub String);

/// What the publisher needs from a browser. Every call blocks until the
/// browser answers.
pub trait Browser {
    fn navigate(&mut self, url: &str) -> UiResult<()>;

    fn find(&mut self, locator: &Locator) -> UiResult<Element>;

    /// An empty list is not an error.
    fn find_all(&mut self, locator: &Locator) -> UiResult<Vec<Element>>;

    fn find_within(&mut self, parent: &Element, locator: &Locator) -> UiResult<Element>;

    fn find_all_within(&mut self, parent: &Element, locator: &Locator) -> UiResult<Vec<Element>>;

    fn click(&mut self, element: &Element) -> UiResult<()>;

    fn clear(&mut self, element: &Element) -> UiResult<()>;

    fn send_keys(&mut self, element: &Element, text: &str) -> UiResult<()>;

    fn text(&mut self, element: &Element) -> UiResult<String>;

    fn attribute(&mut self, element: &Element, name: &str) -> UiResult<Option<String>>;

    fn is_selected(&mut self, element: &Element) -> UiResult<bool>;

    fn is_displayed(&mut self, element: &Element) -> UiResult<bool>;

    fn is_enabled(&mut self, element: &Element) -> UiResult<bool>;

    fn execute_script(&mut self, script: &str, args: &[&Element]) -> UiResult<Value>;

    fn quit(&mut self) -> UiResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBlock {
    Start,
    Center,
}

impl ScrollBlock {
    fn as_str(&self) -> &'static str {
        match self {
            ScrollBlock::Start => "start",
            ScrollBlock::Center => "center",
        }
    }
}

pub fn scroll_into_view<B: Browser + ?Sized>(browser: &mut B, element: &Element, block: ScrollBlock) -> UiResult<()> {
    let script = format!("arguments[0].scrollIntoView({{behavior: 'smooth', block: '{}'}});", block.as_str());
    browser.execute_script(&script, &[element])?;
    Ok(())
}

/// Regular click first; if the page swallows it, a script click.
pub fn click_with_fallback<B: Browser + ?Sized>(browser: &mut B, element: &Element) -> UiResult<()> {
    match browser.click(element) {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!("Direct click failed ({}), trying script click", e);
            browser.execute_script(CLICK_SCRIPT, &[element])?;
            Ok(())
        }
    }
}

/// Waits for `locator` to be clickable, scrolls to it and clicks, under `policy`.
/// Every attempt looks the element up again so stale references heal.
pub fn safe_click<B: Browser + ?Sized>(browser: &mut B, waiter: &Waiter, locator: &Locator, policy: &RetryPolicy) -> UiResult<()> {
    policy.run(&format!("click {}", locator), |_| {
        let element = waiter.until_clickable(browser, locator)?;
        scroll_into_view(browser, &element, ScrollBlock::Center)?;
        click_with_fallback(browser, &element)
    })
}
