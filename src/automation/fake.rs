//! In-memory browser for tests. Elements are registered by locator and
//! click/keys hooks let a test change the page as the real admin UI would.

use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::automation::{Browser, Element, Locator, UiError, UiResult, CLICK_SCRIPT};

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub text: String,
    pub value: String,
    pub class: String,
    pub checkbox: bool,
    pub selected: bool,
    pub displayed: bool,
    pub enabled: bool,
}

impl Default for FakeElement {
    fn default() -> Self {
        FakeElement {
            text: String::new(),
            value: String::new(),
            class: String::new(),
            checkbox: false,
            selected: false,
            displayed: true,
            enabled: true,
        }
    }
}

#[derive(Default)]
pub struct FakePage {
    elements: HashMap<String, FakeElement>,
    locators: HashMap<Locator, Vec<String>>,
    broken: bool,
}

impl FakePage {
    /// Every later browser call fails as if the browser process died.
    pub fn break_session(&mut self) {
        self.broken = true;
    }

    pub fn add(&mut self, locator: Locator, id: &str) -> &mut FakeElement {
        self.locators.entry(locator).or_default().push(id.to_string());
        self.elements.entry(id.to_string()).or_default()
    }

    pub fn remove(&mut self, locator: &Locator) {
        self.locators.remove(locator);
    }

    pub fn element(&mut self, id: &str) -> &mut FakeElement {
        self.elements.get_mut(id).unwrap_or_else(|| panic!("no fake element {}", id))
    }

    fn lookup(&self, locator: &Locator) -> Vec<Element> {
        self.locators.get(locator)
            .map(|ids| ids.iter().map(|id| Element(id.clone())).collect())
            .unwrap_or_default()
    }
}

type Hook = Box<dyn FnMut(&mut FakePage)>;

#[derive(Default)]
struct FakeState {
    page: FakePage,
    click_hooks: HashMap<String, Hook>,
    enter_hooks: HashMap<String, Hook>,
    log: Vec<String>,
    urls: Vec<String>,
    quit_count: u32,
}

/// Cloning gives another handle on the same page, so a test can keep
/// looking at it after handing the browser over.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    state: Rc<RefCell<FakeState>>,
}

impl FakeBrowser {
    pub fn new() -> FakeBrowser {
        FakeBrowser::default()
    }

    pub fn page(&self) -> RefMut<'_, FakePage> {
        RefMut::map(self.state.borrow_mut(), |s| &mut s.page)
    }

    pub fn add(&mut self, locator: Locator, id: &str) -> RefMut<'_, FakeElement> {
        RefMut::map(self.state.borrow_mut(), |s| s.page.add(locator, id))
    }

    pub fn on_click(&mut self, id: &str, hook: impl FnMut(&mut FakePage) + 'static) {
        self.state.borrow_mut().click_hooks.insert(id.to_string(), Box::new(hook));
    }

    pub fn on_enter(&mut self, id: &str, hook: impl FnMut(&mut FakePage) + 'static) {
        self.state.borrow_mut().enter_hooks.insert(id.to_string(), Box::new(hook));
    }

    pub fn break_session(&mut self) {
        self.page().break_session();
    }

    pub fn log_entries(&self, entry: &str) -> usize {
        self.state.borrow().log.iter().filter(|e| *e == entry).count()
    }

    /// Direct and script clicks together.
    pub fn clicks(&self, id: &str) -> usize {
        self.log_entries(&format!("click:{}", id)) + self.log_entries(&format!("script-click:{}", id))
    }

    pub fn value(&self, id: &str) -> String {
        self.state.borrow_mut().page.element(id).value.clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.state.borrow().urls.clone()
    }

    pub fn quit_count(&self) -> u32 {
        self.state.borrow().quit_count
    }

    fn check_session(&self) -> UiResult<()> {
        if self.state.borrow().page.broken {
            return Err(UiError::Session("browser went away".to_string()));
        }
        Ok(())
    }

    fn with_element<T>(&self, element: &Element, f: impl FnOnce(&mut FakeElement) -> T) -> UiResult<T> {
        self.check_session()?;
        let mut state = self.state.borrow_mut();
        match state.page.elements.get_mut(&element.0) {
            Some(e) => Ok(f(e)),
            None => Err(UiError::StaleElement(element.0.clone())),
        }
    }

    fn activate(&self, element: &Element, entry: String) -> UiResult<()> {
        self.with_element(element, |e| {
            if e.checkbox {
                e.selected = !e.selected;
            }
        })?;

        let mut state = self.state.borrow_mut();
        state.log.push(entry);
        let FakeState { page, click_hooks, .. } = &mut *state;
        if let Some(hook) = click_hooks.get_mut(&element.0) {
            hook(page);
        }
        Ok(())
    }
}

impl Browser for FakeBrowser {
    fn navigate(&mut self, url: &str) -> UiResult<()> {
        self.check_session()?;
        self.state.borrow_mut().urls.push(url.to_string());
        Ok(())
    }

    fn find(&mut self, locator: &Locator) -> UiResult<Element> {
        self.check_session()?;
        self.state.borrow().page.lookup(locator)
            .into_iter()
            .next()
            .ok_or_else(|| UiError::ElementNotFound(locator.to_string()))
    }

    fn find_all(&mut self, locator: &Locator) -> UiResult<Vec<Element>> {
        self.check_session()?;
        Ok(self.state.borrow().page.lookup(locator))
    }

    fn find_within(&mut self, _parent: &Element, locator: &Locator) -> UiResult<Element> {
        self.find(locator)
    }

    fn find_all_within(&mut self, _parent: &Element, locator: &Locator) -> UiResult<Vec<Element>> {
        self.find_all(locator)
    }

    fn click(&mut self, element: &Element) -> UiResult<()> {
        let clickable = self.with_element(element, |e| e.displayed && e.enabled)?;
        if !clickable {
            return Err(UiError::ClickIntercepted(element.0.clone()));
        }
        self.activate(element, format!("click:{}", element.0))
    }

    fn clear(&mut self, element: &Element) -> UiResult<()> {
        self.with_element(element, |e| e.value.clear())
    }

    fn send_keys(&mut self, element: &Element, text: &str) -> UiResult<()> {
        if text == super::KEY_RETURN {
            self.check_session()?;
            let mut state = self.state.borrow_mut();
            state.log.push(format!("enter:{}", element.0));
            let FakeState { page, enter_hooks, .. } = &mut *state;
            if let Some(hook) = enter_hooks.get_mut(&element.0) {
                hook(page);
            }
            return Ok(());
        }
        self.with_element(element, |e| e.value.push_str(text))
    }

    fn text(&mut self, element: &Element) -> UiResult<String> {
        self.with_element(element, |e| e.text.clone())
    }

    fn attribute(&mut self, element: &Element, name: &str) -> UiResult<Option<String>> {
        self.with_element(element, |e| match name {
            "class" => Some(e.class.clone()),
            "value" => Some(e.value.clone()),
            _ => None,
        })
    }

    fn is_selected(&mut self, element: &Element) -> UiResult<bool> {
        self.with_element(element, |e| e.selected)
    }

    fn is_displayed(&mut self, element: &Element) -> UiResult<bool> {
        self.with_element(element, |e| e.displayed)
    }

    fn is_enabled(&mut self, element: &Element) -> UiResult<bool> {
        self.with_element(element, |e| e.enabled)
    }

    fn execute_script(&mut self, script: &str, args: &[&Element]) -> UiResult<Value> {
        self.check_session()?;
        let Some(target) = args.first() else {
            return Ok(Value::Null);
        };

        if script == CLICK_SCRIPT {
            self.activate(target, format!("script-click:{}", target.0))?;
        } else if script.contains("scrollIntoView") {
            self.with_element(target, |_| ())?;
            self.state.borrow_mut().log.push(format!("scroll:{}", target.0));
        } else if script.contains("classList.remove('closed')") {
            self.with_element(target, |e| {
                e.class = e.class.split_whitespace()
                    .filter(|c| *c != "closed")
                    .collect::<Vec<_>>()
                    .join(" ");
            })?;
            self.state.borrow_mut().log.push(format!("script:{}", target.0));
        }
        Ok(Value::Null)
    }

    fn quit(&mut self) -> UiResult<()> {
        self.state.borrow_mut().quit_count += 1;
        Ok(())
    }
}
