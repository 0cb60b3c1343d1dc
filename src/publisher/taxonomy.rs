use spdlog::{debug, info, warn};

use crate::automation::{click_with_fallback, scroll_into_view, Browser, Element, Locator, ScrollBlock, UiError, UiResult, KEY_RETURN};
use crate::publisher::selectors::*;
use crate::publisher::Publisher;
use crate::text_utils::{normalize_tags, xpath_literal};

const OPEN_PANEL_SCRIPT: &str = "arguments[0].classList.remove('closed');";

/// Checkbox of the category whose label contains `category`, ignoring case.
fn category_checkbox(category: &str) -> Locator {
    Locator::xpath(format!(
        "//label[contains(translate(., 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), {})]/input[@type='checkbox']",
        xpath_literal(&category.to_lowercase())))
}

impl<B: Browser> Publisher<B> {
    pub(crate) fn set_category(&mut self, category: &str) -> UiResult<()> {
        let panel = self.waiter.until_present(&mut self.browser, &Locator::id(CATEGORY_DIV))?;
        scroll_into_view(&mut self.browser, &panel, ScrollBlock::Center)?;
        self.pause(self.pacing.step);

        if let Err(e) = self.expand_panel(&panel) {
            if e.is_fatal() {
                return Err(e);
            }
            warn!("Could not verify category section state: {}", e);
        }

        let checklist = self.waiter.until_present(&mut self.browser, &Locator::id(CATEGORY_CHECKLIST))?;
        scroll_into_view(&mut self.browser, &checklist, ScrollBlock::Center)?;
        self.pause(self.pacing.step);

        let checkbox = self.waiter.until_present(&mut self.browser, &category_checkbox(category))?;
        if !self.browser.is_selected(&checkbox)? {
            click_with_fallback(&mut self.browser, &checkbox)?;
            self.pause(self.pacing.short);

            if !self.browser.is_selected(&checkbox)? {
                return Err(UiError::Unverified(format!("Category '{}' could not be selected", category)));
            }
        }

        info!("Category set: {}", category);
        Ok(())
    }

    /// Opens a collapsed postbox: toggle first, then drop the class by script.
    fn expand_panel(&mut self, panel: &Element) -> UiResult<()> {
        if !self.is_collapsed(panel)? {
            return Ok(());
        }

        let toggle = self.browser.find_within(panel, &Locator::class_name(PANEL_TOGGLE))?;
        self.browser.click(&toggle)?;
        self.pause(self.pacing.step);

        if self.is_collapsed(panel)? {
            debug!("Panel still collapsed after toggle, opening it by script");
            self.browser.execute_script(OPEN_PANEL_SCRIPT, &[panel])?;
            self.pause(self.pacing.step);
        }
        Ok(())
    }

    fn is_collapsed(&mut self, panel: &Element) -> UiResult<bool> {
        let class = self.browser.attribute(panel, "class")?.unwrap_or_default();
        Ok(class.split_whitespace().any(|c| c == "closed"))
    }

    /// Types all tags at once and submits with Enter. If no tag shows up
    /// the Add button gets one click.
    pub(crate) fn set_tags(&mut self, tags: &str) -> UiResult<()> {
        let normalized = normalize_tags(tags);
        if normalized.is_empty() {
            return Err(UiError::Unverified(format!("No usable tags in '{}'", tags)));
        }

        let field = self.browser.find(&Locator::id(TAG_INPUT))?;
        self.browser.clear(&field)?;
        self.browser.send_keys(&field, &normalized)?;
        self.browser.send_keys(&field, KEY_RETURN)?;

        match self.waiter.until_present(&mut self.browser, &Locator::css(TAG_CHIP)) {
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => {
                debug!("No tags listed after Enter, clicking Add");
                let add = self.browser.find(&Locator::css(TAG_ADD))?;
                self.browser.click(&add)?;
            }
        }

        info!("Tags added: {}", normalized);
        Ok(())
    }
}
