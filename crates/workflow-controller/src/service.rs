//! Step execution against a live page.

use std::sync::Arc;
use std::time::Duration;

use cdp_bridge::DomBridge;
use element_locator::{truncate_selector, ElementHandle, ElementLocator, LocateHints, LocatorError};
use tracing::{debug, info};

use crate::errors::ControllerError;
use crate::views::{
    AssertElementExistsParams, AssertTextContainsParams, AssertUrlContainsParams, ClickParams,
    InputParams, KeyPressParams, NavigationParams, ScrollParams, SelectChangeParams, WorkflowStep,
};

pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 2500;

/// Key presses often follow a submit-style input and land on a page that is
/// still settling, so they get a longer budget.
const KEY_PRESS_TIMEOUT_MS: u64 = 5000;

/// Pause after filling a field so reactive UIs observe the change before
/// the next step runs.
const INPUT_SETTLE: Duration = Duration::from_millis(200);

/// Result of one successfully replayed step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionOutcome {
    pub message: String,
}

impl ActionOutcome {
    fn new(message: String) -> Self {
        info!("{message}");
        Self { message }
    }
}

/// Replays recorded steps one at a time. Holds no per-page state; every
/// step resolves its element from scratch.
pub struct WorkflowController {
    bridge: Arc<dyn DomBridge>,
    locator: ElementLocator,
}

impl WorkflowController {
    pub fn new(bridge: Arc<dyn DomBridge>) -> Self {
        let locator = ElementLocator::new(bridge.clone());
        Self { bridge, locator }
    }

    pub async fn run_step(&self, step: &WorkflowStep) -> Result<ActionOutcome, ControllerError> {
        match step {
            WorkflowStep::Navigation(params) => self.navigation(params).await,
            WorkflowStep::Click(params) => self.click(params).await,
            WorkflowStep::Input(params) => self.input(params).await,
            WorkflowStep::SelectChange(params) => self.select_change(params).await,
            WorkflowStep::KeyPress(params) => self.key_press(params).await,
            WorkflowStep::Scroll(params) => self.scroll(params).await,
            WorkflowStep::AssertElementExists(params) => self.assert_element_exists(params).await,
            WorkflowStep::AssertTextContains(params) => self.assert_text_contains(params).await,
            WorkflowStep::AssertUrlContains(params) => self.assert_url_contains(params).await,
        }
    }

    async fn locate(
        &self,
        selector: &str,
        hints: &LocateHints,
        timeout_ms: u64,
    ) -> Result<ElementHandle, ControllerError> {
        let handle = self
            .locator
            .locate(selector, hints, Duration::from_millis(timeout_ms))
            .await?;
        Ok(handle)
    }

    async fn navigation(&self, params: &NavigationParams) -> Result<ActionOutcome, ControllerError> {
        self.bridge.navigate(&params.url).await?;
        Ok(ActionOutcome::new(format!("Navigated to URL: {}", params.url)))
    }

    async fn click(&self, params: &ClickParams) -> Result<ActionOutcome, ControllerError> {
        // A recorded top-level click declares the page it happened on. When
        // replay finds itself elsewhere, navigate there first instead of
        // hunting for the element on the wrong page. Frame-scoped clicks
        // skip this: their declared URL is the frame's, not the page's.
        let declared = strip_fragment(params.meta.url.as_deref().unwrap_or(""));
        if declared.starts_with("http") && !params.meta.has_frame_hints() {
            let current = self.bridge.current_url().await?;
            let current = strip_fragment(current.as_deref().unwrap_or(""));
            if declared != current {
                debug!(declared, current, "navigating to declared step URL before click");
                self.bridge.navigate(declared).await?;
            }
        }

        let handle = self
            .locate(
                &params.css_selector,
                &params.meta.locate_hints(),
                DEFAULT_ACTION_TIMEOUT_MS,
            )
            .await?;
        self.bridge.click(&handle.node).await?;

        Ok(ActionOutcome::new(format!(
            "Clicked element with CSS selector: {} (original: {})",
            truncate_selector(&handle.selector_used),
            truncate_selector(&params.css_selector),
        )))
    }

    async fn input(&self, params: &InputParams) -> Result<ActionOutcome, ControllerError> {
        let handle = self
            .locate(
                &params.css_selector,
                &params.meta.locate_hints(),
                DEFAULT_ACTION_TIMEOUT_MS,
            )
            .await?;
        self.bridge.fill(&handle.node, &params.value).await?;
        tokio::time::sleep(INPUT_SETTLE).await;

        Ok(ActionOutcome::new(format!(
            "Input \"{}\" into element with CSS selector: {} (original: {})",
            params.value,
            truncate_selector(&handle.selector_used),
            truncate_selector(&params.css_selector),
        )))
    }

    async fn select_change(
        &self,
        params: &SelectChangeParams,
    ) -> Result<ActionOutcome, ControllerError> {
        let handle = self
            .locate(
                &params.css_selector,
                &params.meta.locate_hints(),
                DEFAULT_ACTION_TIMEOUT_MS,
            )
            .await?;
        self.bridge
            .select_option(&handle.node, &params.selected_text)
            .await?;

        Ok(ActionOutcome::new(format!(
            "Selected option \"{}\" in dropdown {} (original: {})",
            params.selected_text,
            truncate_selector(&handle.selector_used),
            truncate_selector(&params.css_selector),
        )))
    }

    async fn key_press(&self, params: &KeyPressParams) -> Result<ActionOutcome, ControllerError> {
        let handle = self
            .locate(
                &params.css_selector,
                &params.meta.locate_hints(),
                KEY_PRESS_TIMEOUT_MS,
            )
            .await?;
        self.bridge.focus(&handle.node).await?;
        self.bridge
            .press_key(&handle.scope.session, &params.key)
            .await?;

        Ok(ActionOutcome::new(format!(
            "Pressed key '{}' on element with CSS selector: {} (original: {})",
            params.key,
            truncate_selector(&handle.selector_used),
            truncate_selector(&params.css_selector),
        )))
    }

    async fn scroll(&self, params: &ScrollParams) -> Result<ActionOutcome, ControllerError> {
        self.bridge
            .scroll_by(params.scroll_x, params.scroll_y)
            .await?;
        Ok(ActionOutcome::new(format!(
            "Scrolled page by (x={}, y={})",
            params.scroll_x, params.scroll_y
        )))
    }

    async fn assert_element_exists(
        &self,
        params: &AssertElementExistsParams,
    ) -> Result<ActionOutcome, ControllerError> {
        match self
            .locate(&params.css_selector, &LocateHints::default(), params.timeout_ms)
            .await
        {
            Ok(handle) => Ok(ActionOutcome::new(format!(
                "Element exists: {}",
                truncate_selector(&handle.selector_used)
            ))),
            Err(ControllerError::Locate(LocatorError::NotFound { selector })) => {
                Err(ControllerError::AssertionFailed(format!(
                    "no element matched selector {}",
                    truncate_selector(&selector)
                )))
            }
            Err(other) => Err(other),
        }
    }

    async fn assert_text_contains(
        &self,
        params: &AssertTextContainsParams,
    ) -> Result<ActionOutcome, ControllerError> {
        let haystack = match params.css_selector.as_deref() {
            Some(selector) => {
                let handle = match self
                    .locate(selector, &LocateHints::default(), params.timeout_ms)
                    .await
                {
                    Ok(handle) => handle,
                    Err(ControllerError::Locate(LocatorError::NotFound { selector })) => {
                        return Err(ControllerError::AssertionFailed(format!(
                            "no element matched selector {}",
                            truncate_selector(&selector)
                        )));
                    }
                    Err(other) => return Err(other),
                };
                self.bridge.text_content(&handle.node).await?
            }
            None => self.bridge.page_text().await?,
        };

        if haystack.contains(&params.expected) {
            Ok(ActionOutcome::new(format!(
                "Text found: \"{}\"",
                params.expected
            )))
        } else {
            Err(ControllerError::AssertionFailed(format!(
                "expected text \"{}\" not present",
                params.expected
            )))
        }
    }

    async fn assert_url_contains(
        &self,
        params: &AssertUrlContainsParams,
    ) -> Result<ActionOutcome, ControllerError> {
        let current = self.bridge.current_url().await?.unwrap_or_default();
        if current.contains(&params.expected) {
            Ok(ActionOutcome::new(format!(
                "URL contains \"{}\"",
                params.expected
            )))
        } else {
            Err(ControllerError::AssertionFailed(format!(
                "URL \"{current}\" does not contain \"{}\"",
                params.expected
            )))
        }
    }
}

fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}
