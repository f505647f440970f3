//! Wire schema for recorded workflow steps.
//!
//! Field names mirror the recorder's JSON payloads (camelCase). Recorder
//! events carry extra fields the replayer has no use for; unknown fields
//! are ignored rather than rejected so recorder and replayer can evolve
//! independently.

use element_locator::LocateHints;
use serde::{Deserialize, Serialize};

fn default_assert_timeout_ms() -> u64 {
    2000
}

/// Context the recorder captures alongside an element interaction. All of
/// it is advisory; replay degrades gracefully when any piece is missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderMeta {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub tab_id: Option<i64>,
    /// Recorded for diagnostics only; replay queries CSS.
    #[serde(default)]
    pub xpath: Option<String>,
    #[serde(default)]
    pub element_tag: Option<String>,
    #[serde(default)]
    pub element_text: Option<String>,
    #[serde(default)]
    pub frame_url: Option<String>,
    #[serde(default)]
    pub frame_id_path: Option<String>,
    /// URL of the page the step was recorded on.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
}

impl RecorderMeta {
    /// Whether the step was recorded inside a frame (as opposed to the
    /// top-level document).
    pub fn has_frame_hints(&self) -> bool {
        self.frame_id_path.is_some() || self.frame_url.is_some()
    }

    pub fn locate_hints(&self) -> LocateHints {
        LocateHints {
            element_tag: self.element_tag.clone(),
            element_text: self.element_text.clone(),
            frame_url: self.frame_url.clone(),
            frame_path: self.frame_id_path.clone(),
            page_url: self.url.clone(),
        }
    }
}

/// One recorded step, tagged by `type` on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowStep {
    Navigation(NavigationParams),
    Click(ClickParams),
    Input(InputParams),
    SelectChange(SelectChangeParams),
    KeyPress(KeyPressParams),
    Scroll(ScrollParams),
    AssertElementExists(AssertElementExistsParams),
    AssertTextContains(AssertTextContainsParams),
    AssertUrlContains(AssertUrlContainsParams),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationParams {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickParams {
    pub css_selector: String,
    #[serde(flatten)]
    pub meta: RecorderMeta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParams {
    pub css_selector: String,
    pub value: String,
    #[serde(flatten)]
    pub meta: RecorderMeta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectChangeParams {
    pub css_selector: String,
    pub selected_value: String,
    /// Visible label of the option; this is what gets matched on replay.
    pub selected_text: String,
    #[serde(flatten)]
    pub meta: RecorderMeta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPressParams {
    pub css_selector: String,
    pub key: String,
    #[serde(flatten)]
    pub meta: RecorderMeta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollParams {
    #[serde(default)]
    pub scroll_x: i64,
    #[serde(default)]
    pub scroll_y: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertElementExistsParams {
    pub css_selector: String,
    #[serde(default = "default_assert_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertTextContainsParams {
    pub expected: String,
    /// When set, scope the search to this element's text; otherwise the
    /// whole rendered page is searched.
    #[serde(default)]
    pub css_selector: Option<String>,
    #[serde(default = "default_assert_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertUrlContainsParams {
    pub expected: String,
}
