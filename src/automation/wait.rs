use std::thread;
use std::time::{Duration, Instant};

use spdlog::error;

use crate::automation::{Browser, Element, Locator, UiError, UiResult};

const DEFAULT_POLL: Duration = Duration::from_millis(250);

/// Bounded waits for page conditions. Transient lookup errors are polled
/// through until `timeout`; anything else returns right away.
#[derive(Debug, Clone, Copy)]
pub struct Waiter {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration) -> Waiter {
        Waiter {
            timeout,
            poll: DEFAULT_POLL,
        }
    }

    /// Checks once and gives up.
    pub fn immediate() -> Waiter {
        Waiter {
            timeout: Duration::ZERO,
            poll: Duration::ZERO,
        }
    }

    pub fn until_present<B: Browser + ?Sized>(&self, browser: &mut B, locator: &Locator) -> UiResult<Element> {
        self.poll_until(locator, "present", || browser.find(locator).map(Some))
    }

    /// Present, displayed and enabled.
    pub fn until_clickable<B: Browser + ?Sized>(&self, browser: &mut B, locator: &Locator) -> UiResult<Element> {
        self.poll_until(locator, "clickable", || {
            let element = browser.find(locator)?;
            if browser.is_displayed(&element)? && browser.is_enabled(&element)? {
                Ok(Some(element))
            } else {
                Ok(None)
            }
        })
    }

    /// At least one match.
    pub fn until_all_present<B: Browser + ?Sized>(&self, browser: &mut B, locator: &Locator) -> UiResult<Vec<Element>> {
        self.poll_until(locator, "present", || {
            let elements = browser.find_all(locator)?;
            Ok(if elements.is_empty() { None } else { Some(elements) })
        })
    }

    fn poll_until<T, F>(&self, locator: &Locator, condition: &str, mut check: F) -> UiResult<T>
        where F: FnMut() -> UiResult<Option<T>> {
        let start = Instant::now();

        loop {
            match check() {
                Ok(Some(found)) => return Ok(found),
                Ok(None) => {}
                Err(e) if e.is_transient() => {}
                Err(e) => return Err(e),
            }

            if start.elapsed() >= self.timeout {
                error!("Timeout waiting for element: {} (condition: {})", locator, condition);
                return Err(UiError::Timeout(format!("{} to be {}", locator, condition)));
            }
            thread::sleep(self.poll);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::automation::fake::FakeBrowser;

    use super::*;

    #[test]
    fn test_until_present() {
        let mut browser = FakeBrowser::new();
        browser.add(Locator::id("title"), "title");

        let waiter = Waiter::immediate();
        assert_eq!(waiter.until_present(&mut browser, &Locator::id("title")).unwrap(), Element("title".to_string()));
        let err = waiter.until_present(&mut browser, &Locator::id("missing")).unwrap_err();
        assert_eq!(err, UiError::Timeout("#missing to be present".to_string()));
    }

    #[test]
    fn test_until_clickable() {
        let mut browser = FakeBrowser::new();
        browser.add(Locator::id("publish"), "publish").enabled = false;

        let waiter = Waiter::immediate();
        assert!(waiter.until_clickable(&mut browser, &Locator::id("publish")).is_err());

        browser.page().element("publish").enabled = true;
        assert!(waiter.until_clickable(&mut browser, &Locator::id("publish")).is_ok());
    }

    #[test]
    fn test_until_all_present() {
        let mut browser = FakeBrowser::new();
        let waiter = Waiter::immediate();
        let images = Locator::css(".attachment-preview");
        assert!(waiter.until_all_present(&mut browser, &images).is_err());

        browser.add(images.clone(), "img1");
        browser.add(images.clone(), "img2");
        assert_eq!(waiter.until_all_present(&mut browser, &images).unwrap().len(), 2);
    }

    #[test]
    fn test_session_error_is_not_polled() {
        let mut browser = FakeBrowser::new();
        browser.break_session();
        let waiter = Waiter::new(Duration::from_secs(60));
        let err = waiter.until_present(&mut browser, &Locator::id("title")).unwrap_err();
        assert!(err.is_fatal());
    }
}
