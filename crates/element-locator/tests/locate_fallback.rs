//! End-to-end locate behavior against a scripted in-memory bridge.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cdp_bridge::{
    BoundingBox, BridgeError, BridgeErrorKind, DomBridge, FrameInfo, FrameSnapshot, NodeRef,
    QuerySession,
};
use element_locator::{ElementLocator, LocateHints, LocatorError};
use reweave_core_types::{FrameId, SessionId, TargetId};

const FOCUS_TARGET: &str = "page-target";
const FOCUS_SESSION: &str = "focus-session";

#[derive(Clone)]
struct FakeElement {
    backend_node_id: u64,
    bounds: Option<BoundingBox>,
    /// Number of queries for this key before the element shows up.
    visible_after: u64,
}

fn visible(backend_node_id: u64) -> FakeElement {
    FakeElement {
        backend_node_id,
        bounds: Some(BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 80.0,
            height: 20.0,
        }),
        visible_after: 0,
    }
}

fn flat(backend_node_id: u64) -> FakeElement {
    FakeElement {
        backend_node_id,
        bounds: Some(BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 10.0,
        }),
        visible_after: 0,
    }
}

struct FakeBridge {
    snapshot: FrameSnapshot,
    elements: HashMap<(Option<FrameId>, String), FakeElement>,
    broken_targets: HashSet<TargetId>,
    query_counts: Mutex<HashMap<(Option<FrameId>, String), u64>>,
    queried_frames: Mutex<HashSet<Option<FrameId>>>,
}

impl FakeBridge {
    fn new(snapshot: FrameSnapshot) -> Self {
        Self {
            snapshot,
            elements: HashMap::new(),
            broken_targets: HashSet::new(),
            query_counts: Mutex::new(HashMap::new()),
            queried_frames: Mutex::new(HashSet::new()),
        }
    }

    fn with_element(mut self, frame: Option<&str>, selector: &str, element: FakeElement) -> Self {
        self.elements
            .insert((frame.map(FrameId::from), selector.to_string()), element);
        self
    }

    fn with_broken_target(mut self, target: &str) -> Self {
        self.broken_targets.insert(TargetId::from(target));
        self
    }

    fn queried_frames(&self) -> HashSet<Option<FrameId>> {
        self.queried_frames.lock().unwrap().clone()
    }
}

#[async_trait]
impl DomBridge for FakeBridge {
    async fn frame_tree(&self) -> Result<FrameSnapshot, BridgeError> {
        Ok(self.snapshot.clone())
    }

    async fn focus_session(&self) -> Result<QuerySession, BridgeError> {
        Ok(QuerySession::new(
            SessionId::from(FOCUS_SESSION),
            TargetId::from(FOCUS_TARGET),
        ))
    }

    async fn open_session(&self, target: &TargetId) -> Result<QuerySession, BridgeError> {
        if self.broken_targets.contains(target) {
            return Err(BridgeError::new(BridgeErrorKind::SessionUnavailable)
                .with_hint(format!("target {target} refused attach")));
        }
        Ok(QuerySession::new(
            SessionId::from(format!("session-{target}").as_str()),
            target.clone(),
        ))
    }

    async fn query_selector(
        &self,
        session: &QuerySession,
        frame: Option<&FrameId>,
        selector: &str,
    ) -> Result<Option<NodeRef>, BridgeError> {
        let key = (frame.cloned(), selector.to_string());
        self.queried_frames.lock().unwrap().insert(frame.cloned());
        let count = {
            let mut counts = self.query_counts.lock().unwrap();
            let entry = counts.entry(key.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        Ok(self.elements.get(&key).and_then(|element| {
            if count > element.visible_after {
                Some(NodeRef {
                    backend_node_id: element.backend_node_id,
                    session_id: session.session_id.clone(),
                })
            } else {
                None
            }
        }))
    }

    async fn bounding_box(&self, node: &NodeRef) -> Result<Option<BoundingBox>, BridgeError> {
        Ok(self
            .elements
            .values()
            .find(|element| element.backend_node_id == node.backend_node_id)
            .and_then(|element| element.bounds))
    }

    async fn click(&self, _node: &NodeRef) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn fill(&self, _node: &NodeRef, _value: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn select_option(&self, _node: &NodeRef, _label: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn focus(&self, _node: &NodeRef) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn press_key(&self, _session: &QuerySession, _key: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn navigate(&self, _url: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<Option<String>, BridgeError> {
        Ok(None)
    }

    async fn scroll_by(&self, _dx: i64, _dy: i64) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn text_content(&self, _node: &NodeRef) -> Result<String, BridgeError> {
        Ok(String::new())
    }

    async fn page_text(&self) -> Result<String, BridgeError> {
        Ok(String::new())
    }
}

fn frame(id: &str, url: &str, parent: Option<&str>, children: &[&str], target: Option<&str>) -> FrameInfo {
    FrameInfo {
        frame_id: FrameId::from(id),
        target_id: target.map(TargetId::from),
        url: Some(url.to_string()),
        parent_id: parent.map(FrameId::from),
        child_ids: children.iter().map(|c| FrameId::from(*c)).collect(),
    }
}

fn page_with_iframes() -> FrameSnapshot {
    let mut snapshot = FrameSnapshot::default();
    snapshot.insert(frame(
        "root",
        "https://app.example.com/login",
        None,
        &["widget", "ads"],
        Some(FOCUS_TARGET),
    ));
    snapshot.insert(frame(
        "widget",
        "https://widget.example.net/embed",
        Some("root"),
        &[],
        None,
    ));
    snapshot.insert(frame(
        "ads",
        "https://ads.example.org/banner",
        Some("root"),
        &[],
        None,
    ));
    snapshot
}

fn locator(bridge: Arc<FakeBridge>) -> ElementLocator {
    ElementLocator::new(bridge)
}

#[tokio::test]
async fn seed_selector_wins_in_primary_frame() {
    let bridge = Arc::new(
        FakeBridge::new(page_with_iframes()).with_element(Some("root"), "#login-button", visible(1)),
    );
    let handle = locator(bridge.clone())
        .locate("#login-button", &LocateHints::default(), Duration::from_millis(300))
        .await
        .unwrap();

    assert_eq!(handle.selector_used, "#login-button");
    assert_eq!(handle.scope.frame_id, Some(FrameId::from("root")));
    assert_eq!(handle.node.backend_node_id, 1);
}

#[tokio::test]
async fn earlier_candidate_outranks_later_one() {
    // Seed "input.form-field[placeholder=\"Email\"]" expands to, in order:
    // the seed, input[placeholder*="Email"], input.form-field[placeholder*="Email"],
    // input.form-field. Only the last two resolve; the earlier must win.
    let bridge = Arc::new(
        FakeBridge::new(page_with_iframes())
            .with_element(
                Some("root"),
                "input.form-field[placeholder*=\"Email\"]",
                visible(21),
            )
            .with_element(Some("root"), "input.form-field", visible(22)),
    );
    let handle = locator(bridge)
        .locate(
            "input.form-field[placeholder=\"Email\"]",
            &LocateHints::default(),
            Duration::from_millis(300),
        )
        .await
        .unwrap();

    assert_eq!(handle.selector_used, "input.form-field[placeholder*=\"Email\"]");
    assert_eq!(handle.node.backend_node_id, 21);
}

#[tokio::test]
async fn late_rendering_element_is_found_by_polling() {
    let mut element = visible(5);
    element.visible_after = 2;
    let bridge = Arc::new(
        FakeBridge::new(page_with_iframes()).with_element(Some("root"), "#late", element),
    );
    let handle = locator(bridge)
        .locate("#late", &LocateHints::default(), Duration::from_millis(1000))
        .await
        .unwrap();

    assert_eq!(handle.selector_used, "#late");
}

#[tokio::test]
async fn fallback_scan_returns_correct_selector_and_scope() {
    // Nothing in the primary frame. In the widget frame, candidate 1 is
    // present but has a zero-width box and candidate 2 is visible; the ads
    // frame also carries candidate 2 but its URL scores lower against the
    // page hint, so the widget frame must be swept first.
    let hints = LocateHints::default()
        .with_frame_path("0") // stays at root
        .with_page_url("https://widget.example.net/");
    let bridge = Arc::new(
        FakeBridge::new(page_with_iframes())
            .with_element(Some("widget"), "input[placeholder*=\"Email\"]", flat(31))
            .with_element(
                Some("widget"),
                "input.form-field[placeholder*=\"Email\"]",
                visible(32),
            )
            .with_element(
                Some("ads"),
                "input.form-field[placeholder*=\"Email\"]",
                visible(33),
            ),
    );

    let handle = locator(bridge.clone())
        .locate(
            "input.form-field[placeholder=\"Email\"]",
            &hints,
            Duration::from_millis(120),
        )
        .await
        .unwrap();

    assert_eq!(handle.scope.frame_id, Some(FrameId::from("widget")));
    assert_eq!(handle.selector_used, "input.form-field[placeholder*=\"Email\"]");
    assert_eq!(handle.node.backend_node_id, 32);
}

#[tokio::test]
async fn frame_url_hint_moves_primary_scope() {
    let hints = LocateHints::default().with_frame_url("https://widget.example.net/embed");
    let bridge = Arc::new(
        FakeBridge::new(page_with_iframes()).with_element(Some("widget"), "#inside", visible(41)),
    );
    let handle = locator(bridge)
        .locate("#inside", &hints, Duration::from_millis(300))
        .await
        .unwrap();

    assert_eq!(handle.scope.frame_id, Some(FrameId::from("widget")));
}

#[tokio::test]
async fn broken_frame_session_degrades_to_focus_session() {
    let mut snapshot = page_with_iframes();
    snapshot.insert(frame(
        "widget",
        "https://widget.example.net/embed",
        Some("root"),
        &[],
        Some("widget-target"),
    ));
    let hints = LocateHints::default().with_frame_url("https://widget.example.net/embed");
    let bridge = Arc::new(
        FakeBridge::new(snapshot)
            .with_broken_target("widget-target")
            .with_element(Some("widget"), "#inside", visible(51)),
    );

    let handle = locator(bridge)
        .locate("#inside", &hints, Duration::from_millis(300))
        .await
        .unwrap();

    assert_eq!(handle.scope.frame_id, Some(FrameId::from("widget")));
    assert_eq!(handle.scope.session.session_id, SessionId::from(FOCUS_SESSION));
}

#[tokio::test]
async fn zero_area_match_never_counts_as_found() {
    let bridge = Arc::new(
        FakeBridge::new(page_with_iframes()).with_element(Some("root"), "#collapsed", flat(61)),
    );
    let err = locator(bridge)
        .locate("#collapsed", &LocateHints::default(), Duration::from_millis(120))
        .await
        .unwrap_err();

    assert!(matches!(err, LocatorError::NotFound { .. }));
}

#[tokio::test]
async fn exhaustion_reports_seed_and_visits_every_frame() {
    let bridge = Arc::new(FakeBridge::new(page_with_iframes()));
    let err = locator(bridge.clone())
        .locate("#missing", &LocateHints::default(), Duration::from_millis(120))
        .await
        .unwrap_err();

    match err {
        LocatorError::NotFound { selector } => assert_eq!(selector, "#missing"),
        other => panic!("expected NotFound, got {other:?}"),
    }

    let queried = bridge.queried_frames();
    for frame in ["root", "widget", "ads"] {
        assert!(
            queried.contains(&Some(FrameId::from(frame))),
            "frame {frame} was never queried"
        );
    }
}
