use spdlog::{info, warn};

use crate::automation::retry::RetryPolicy;
use crate::automation::{click_with_fallback, scroll_into_view, Browser, Locator, ScrollBlock, UiError, UiResult};
use crate::post::PostStatus;
use crate::publisher::selectors::*;
use crate::publisher::Publisher;

const PUBLISH_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishResult {
    Published { attempts: u32 },
    AlreadyPublished,
    /// `verified` is false when no confirmation message showed up.
    Saved { verified: bool },
}

fn publish_retryable(err: &UiError) -> bool {
    err.is_transient() || matches!(err, UiError::Unverified(_))
}

impl<B: Browser> Publisher<B> {
    /// Publishes or saves the post currently in the form, depending on `status`.
    pub(crate) fn publish_post(&mut self, status: PostStatus) -> UiResult<PublishResult> {
        self.close_all_modals();

        let publish_box = self.waiter.until_present(&mut self.browser, &Locator::id(SUBMIT_DIV))?;
        scroll_into_view(&mut self.browser, &publish_box, ScrollBlock::Start)?;
        self.pause(self.pacing.step);

        match status {
            PostStatus::Publish => self.publish(),
            PostStatus::Draft | PostStatus::Private => self.save_draft(),
        }
    }

    fn publish(&mut self) -> UiResult<PublishResult> {
        if let Err(e) = self.prepare_publish_status() {
            if e.is_fatal() {
                return Err(e);
            }
            warn!("Could not modify post status directly: {}", e);
        }

        if self.is_post_published() {
            info!("Post is already published");
            return Ok(PublishResult::AlreadyPublished);
        }

        let policy = RetryPolicy::new(PUBLISH_ATTEMPTS, self.pacing.retry_backoff)
            .retry_if(publish_retryable);
        let attempts = policy.run("publish", |attempt| {
            let button = self.waiter.until_clickable(&mut self.browser, &Locator::id(PUBLISH))?;
            scroll_into_view(&mut self.browser, &button, ScrollBlock::Center)?;
            self.pause(self.pacing.step);
            click_with_fallback(&mut self.browser, &button)?;
            self.pause(self.pacing.publish_wait);

            if self.is_post_published() {
                Ok(attempt)
            } else {
                Err(UiError::Unverified(format!("Publish attempt {} unsuccessful", attempt)))
            }
        })?;

        info!("Post published successfully");
        Ok(PublishResult::Published { attempts })
    }

    /// Moves the status selector off `Draft` before publishing.
    fn prepare_publish_status(&mut self) -> UiResult<()> {
        let display = self.waiter.until_present(&mut self.browser, &Locator::id(STATUS_DISPLAY))?;
        if !self.browser.text(&display)?.contains("Draft") {
            return Ok(());
        }

        let edit = self.browser.find(&Locator::css(EDIT_STATUS))?;
        self.browser.click(&edit)?;
        self.pause(self.pacing.short);

        let select = self.browser.find(&Locator::id(STATUS_SELECT))?;
        for option in self.browser.find_all_within(&select, &Locator::css("option"))? {
            if self.browser.text(&option)? == "Published" {
                self.browser.click(&option)?;
                break;
            }
        }
        self.pause(self.pacing.short);

        let ok = self.browser.find(&Locator::css(SAVE_STATUS))?;
        self.browser.click(&ok)?;
        self.pause(self.pacing.short);
        Ok(())
    }

    /// Single save, no retries. A missing confirmation is only a warning.
    fn save_draft(&mut self) -> UiResult<PublishResult> {
        let button = self.waiter.until_clickable(&mut self.browser, &Locator::id(SAVE_DRAFT))?;
        scroll_into_view(&mut self.browser, &button, ScrollBlock::Center)?;
        self.pause(self.pacing.step);
        click_with_fallback(&mut self.browser, &button)?;
        self.pause(self.pacing.settle);

        let verified = match self.waiter.until_present(&mut self.browser, &Locator::css(UPDATED_MESSAGE)) {
            Ok(_) => true,
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => {
                warn!("Could not verify draft was saved");
                false
            }
        };
        Ok(PublishResult::Saved { verified })
    }

    /// Success notice first, then the status label. Errors count as not published.
    pub(crate) fn is_post_published(&mut self) -> bool {
        let notice = self.browser.find(&Locator::css(UPDATED_MESSAGE))
            .and_then(|message| self.browser.text(&message));
        if matches!(notice, Ok(ref text) if text.contains("Post published")) {
            return true;
        }

        self.waiter.until_present(&mut self.browser, &Locator::id(STATUS_DISPLAY))
            .and_then(|status| self.browser.text(&status))
            .map(|text| text.contains("Published"))
            .unwrap_or(false)
    }
}
