//! In-memory stand-in for the dataset download page.
//!
//! Mirrors the quirks the extraction code has to cope with: the details panel
//! is shared between rows and keeps whatever the previous row left in it, the
//! download link only shows up after the form is complete and a few polls have
//! gone by, and individual rows can be told to misbehave.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::domain::page_layout;

use super::{RenderSurface, SurfaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    ConfirmSize,
    Secondary,
    MailingList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeElement {
    LocaleSelect,
    BundleLocale,
    Row(usize),
    Panel,
    Control(Control),
    Email,
    DownloadLink { row: usize, slot: usize },
}

#[derive(Debug, Clone)]
pub struct FakeRow {
    pub href: Option<String>,
    pub label: String,
    pub panel_renders: bool,
    /// Download-link polls that come back empty before the link appears.
    pub link_delay_polls: usize,
    pub link_never_appears: bool,
    /// Mailing-list checkbox value the panel shows when this row is selected.
    pub mailing_list_default: Option<bool>,
    /// Extra links with a different label rendered before the real one.
    pub decoy_links: usize,
}

impl FakeRow {
    pub fn with_href(href: &str) -> Self {
        FakeRow {
            href: Some(href.to_string()),
            label: format!("  {}\n", page_layout::DOWNLOAD_LABEL),
            panel_renders: true,
            link_delay_polls: 2,
            link_never_appears: false,
            mailing_list_default: None,
            decoy_links: 0,
        }
    }
}

#[derive(Debug, Default)]
struct PageState {
    rows: Vec<FakeRow>,
    navigated_to: Option<String>,
    viewport: Option<(u32, u32)>,
    locale_opened: bool,
    selected_row: Option<usize>,
    panel_visible: bool,
    toggles: HashMap<Control, bool>,
    activations: HashMap<Control, usize>,
    unresponsive: HashSet<Control>,
    missing: HashSet<Control>,
    email: String,
    email_disabled: bool,
    clear_ignored: bool,
    polls_left: usize,
    row_clicks: Vec<usize>,
    emails_at_reveal: Vec<String>,
}

impl PageState {
    fn gate_open(&self) -> bool {
        self.toggle(Control::ConfirmSize)
            && self.toggle(Control::Secondary)
            && !self.toggle(Control::MailingList)
            && !self.email.is_empty()
    }

    fn toggle(&self, control: Control) -> bool {
        self.toggles.get(&control).copied().unwrap_or(false)
    }

    fn control_present(&self, control: Control) -> bool {
        self.panel_visible && !self.missing.contains(&control)
    }

    fn current_row(&self) -> Option<&FakeRow> {
        self.selected_row
            .and_then(|index| self.rows.get(index.checked_sub(1)?))
    }
}

pub struct FakeCatalogPage {
    state: Mutex<PageState>,
}

impl FakeCatalogPage {
    pub fn new(rows: Vec<FakeRow>) -> Self {
        FakeCatalogPage {
            state: Mutex::new(PageState {
                rows,
                ..Default::default()
            }),
        }
    }

    /// A page that has already been navigated to and has its panel open.
    pub fn with_open_panel() -> Self {
        let page = FakeCatalogPage::new(vec![FakeRow::with_href("https://host/bundle-ab.tar.gz")]);
        {
            let mut state = page.state.lock().unwrap();
            state.navigated_to = Some("https://host/datasets".to_string());
            state.selected_row = Some(1);
            state.panel_visible = true;
        }
        page
    }

    pub fn set_toggle(&self, control: Control, value: bool) {
        self.state.lock().unwrap().toggles.insert(control, value);
    }

    pub fn toggle(&self, control: Control) -> bool {
        self.state.lock().unwrap().toggle(control)
    }

    pub fn activations(&self, control: Control) -> usize {
        self.state
            .lock()
            .unwrap()
            .activations
            .get(&control)
            .copied()
            .unwrap_or(0)
    }

    pub fn make_unresponsive(&self, control: Control) {
        self.state.lock().unwrap().unresponsive.insert(control);
    }

    pub fn remove_control(&self, control: Control) {
        self.state.lock().unwrap().missing.insert(control);
    }

    pub fn set_email(&self, value: &str) {
        self.state.lock().unwrap().email = value.to_string();
    }

    pub fn email(&self) -> String {
        self.state.lock().unwrap().email.clone()
    }

    pub fn row_clicks(&self) -> Vec<usize> {
        self.state.lock().unwrap().row_clicks.clone()
    }

    pub fn emails_at_reveal(&self) -> Vec<String> {
        self.state.lock().unwrap().emails_at_reveal.clone()
    }

    pub fn navigated_to(&self) -> Option<String> {
        self.state.lock().unwrap().navigated_to.clone()
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.state.lock().unwrap().viewport
    }

    /// Makes `clear` a no-op on the email field, as some inputs behave.
    pub fn ignore_clear(&self) {
        self.state.lock().unwrap().clear_ignored = true;
    }

    pub fn disable_email(&self) {
        self.state.lock().unwrap().email_disabled = true;
    }

    fn resolve(&self, selector: &str) -> Option<FakeElement> {
        let state = self.state.lock().unwrap();
        let loaded = state.navigated_to.is_some();

        if selector == page_layout::LOCALE_SELECT {
            return loaded.then_some(FakeElement::LocaleSelect);
        }
        if selector == page_layout::BUNDLE_LOCALE {
            return state.locale_opened.then_some(FakeElement::BundleLocale);
        }
        if selector == page_layout::PANEL_ROOT {
            return state.panel_visible.then_some(FakeElement::Panel);
        }

        let controls = [
            (page_layout::confirm_size(), Control::ConfirmSize),
            (page_layout::secondary_confirmation(), Control::Secondary),
            (page_layout::mailing_list_opt_in(), Control::MailingList),
        ];
        for (control_selector, control) in controls {
            if selector == control_selector {
                return state
                    .control_present(control)
                    .then_some(FakeElement::Control(control));
            }
        }

        if selector == page_layout::email_field() {
            return state.panel_visible.then_some(FakeElement::Email);
        }
        if selector == page_layout::enabled_email_field() {
            return (state.panel_visible && !state.email_disabled).then_some(FakeElement::Email);
        }

        (1..=state.rows.len())
            .find(|&index| page_layout::row_target(index) == selector)
            .filter(|_| loaded)
            .map(FakeElement::Row)
    }

    fn download_links(&self) -> Vec<FakeElement> {
        let mut state = self.state.lock().unwrap();
        let Some(row) = state.current_row().cloned() else {
            return vec![];
        };
        let index = state.selected_row.unwrap_or_default();

        if !state.panel_visible || !state.gate_open() || row.link_never_appears {
            return vec![];
        }
        if state.polls_left > 0 {
            state.polls_left -= 1;
            return vec![];
        }

        let email = state.email.clone();
        state.emails_at_reveal.push(email);
        (0..=row.decoy_links)
            .map(|slot| FakeElement::DownloadLink { row: index, slot })
            .collect()
    }
}

#[async_trait]
impl RenderSurface for FakeCatalogPage {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), SurfaceError> {
        self.state.lock().unwrap().navigated_to = Some(url.to_string());
        Ok(())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.state.lock().unwrap().viewport = Some((width, height));
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Option<FakeElement>, SurfaceError> {
        if selector == page_layout::DOWNLOAD_LINK {
            return Ok(self.download_links().into_iter().next());
        }
        Ok(self.resolve(selector))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<FakeElement>, SurfaceError> {
        if selector == page_layout::DOWNLOAD_LINK {
            return Ok(self.download_links());
        }
        Ok(self.resolve(selector).into_iter().collect())
    }

    async fn click(&self, element: &FakeElement) -> Result<(), SurfaceError> {
        let mut state = self.state.lock().unwrap();
        match *element {
            FakeElement::LocaleSelect => state.locale_opened = true,
            FakeElement::Row(index) => {
                state.row_clicks.push(index);
                state.selected_row = Some(index);
                let row = state.rows[index - 1].clone();
                state.panel_visible = row.panel_renders;
                state.polls_left = row.link_delay_polls;
                if let Some(default) = row.mailing_list_default {
                    state.toggles.insert(Control::MailingList, default);
                }
            }
            FakeElement::Control(control) => {
                *state.activations.entry(control).or_default() += 1;
                if !state.unresponsive.contains(&control) {
                    let current = state.toggle(control);
                    state.toggles.insert(control, !current);
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn clear(&self, element: &FakeElement) -> Result<(), SurfaceError> {
        let mut state = self.state.lock().unwrap();
        if *element == FakeElement::Email && !state.clear_ignored {
            state.email.clear();
        }
        Ok(())
    }

    async fn type_text(&self, element: &FakeElement, text: &str) -> Result<(), SurfaceError> {
        match element {
            FakeElement::Email => {
                self.state.lock().unwrap().email.push_str(text);
                Ok(())
            }
            other => Err(SurfaceError::Other(format!("cannot type into {:?}", other))),
        }
    }

    async fn read_property(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, SurfaceError> {
        let state = self.state.lock().unwrap();
        let value = match (*element, name) {
            (FakeElement::Control(control), "checked") => Some(state.toggle(control).to_string()),
            (FakeElement::Email, "value") => Some(state.email.clone()),
            (FakeElement::DownloadLink { row, slot }, "textContent") => {
                let fake_row = &state.rows[row - 1];
                if slot == fake_row.decoy_links {
                    Some(fake_row.label.clone())
                } else {
                    Some("Download Delta Segment".to_string())
                }
            }
            (FakeElement::DownloadLink { row, slot }, "href") => {
                let fake_row = &state.rows[row - 1];
                if slot == fake_row.decoy_links {
                    fake_row.href.clone()
                } else {
                    Some(format!("https://host/decoy-{}-{}.tar.gz", row, slot))
                }
            }
            _ => None,
        };
        Ok(value)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, SurfaceError> {
        if script.contains("document.readyState") {
            let ready = match self.state.lock().unwrap().navigated_to {
                Some(_) => "complete",
                None => "loading",
            };
            return Ok(serde_json::Value::String(ready.to_string()));
        }
        Ok(serde_json::Value::Null)
    }

    async fn scroll_into_view(&self, _element: &FakeElement) -> Result<(), SurfaceError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), SurfaceError> {
        Ok(())
    }
}
