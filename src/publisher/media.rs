use spdlog::{debug, info, warn};

use crate::automation::{click_with_fallback, scroll_into_view, Browser, Locator, ScrollBlock, UiError, UiResult};
use crate::publisher::selectors::*;
use crate::publisher::Publisher;

impl<B: Browser> Publisher<B> {
    /// Picks the `index`th (1-based) image of the media library as featured
    /// image. Open dialogs are closed whatever happens.
    pub(crate) fn set_featured_image(&mut self, index: usize) -> UiResult<()> {
        let result = self.choose_image(index);
        self.close_all_modals();
        result
    }

    fn choose_image(&mut self, index: usize) -> UiResult<()> {
        self.safe_click(&Locator::id(SET_THUMBNAIL))?;
        self.waiter.until_present(&mut self.browser, &Locator::class_name(MEDIA_MODAL))?;
        self.pause(self.pacing.step);

        self.safe_click(&Locator::css(MEDIA_LIBRARY_TAB))?;
        self.pause(self.pacing.step);

        let images = self.waiter.until_all_present(&mut self.browser, &Locator::css(ATTACHMENT))?;
        if index == 0 || index > images.len() {
            warn!("Image index {} not found in media library ({} images)", index, images.len());
            return Err(UiError::ElementNotFound(format!("media item {} of {}", index, images.len())));
        }

        let image = &images[index - 1];
        scroll_into_view(&mut self.browser, image, ScrollBlock::Center)?;
        self.pause(self.pacing.short);
        click_with_fallback(&mut self.browser, image)?;
        self.pause(self.pacing.short);

        self.safe_click(&Locator::css(MEDIA_SELECT))?;
        self.pause(self.pacing.step);
        info!("Featured image set to media item {}", index);
        Ok(())
    }

    /// Clicks every visible close button of the media dialogs. Never fails.
    pub(crate) fn close_all_modals(&mut self) {
        let buttons = match self.browser.find_all(&Locator::css(MEDIA_CLOSE)) {
            Ok(buttons) => buttons,
            Err(e) => {
                debug!("Could not look for open dialogs: {}", e);
                return;
            }
        };

        for button in buttons {
            if !matches!(self.browser.is_displayed(&button), Ok(true)) {
                continue;
            }
            if let Err(e) = click_with_fallback(&mut self.browser, &button) {
                debug!("Could not close dialog: {}", e);
            }
            self.pause(self.pacing.short);
        }
    }
}
