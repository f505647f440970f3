//! Raw-protocol implementation of [`DomBridge`].
//!
//! Element lookup here goes through node descriptions
//! (`DOM.getDocument` → `DOM.querySelector` → `DOM.describeNode`) rather
//! than in-page script evaluation, so it works uniformly across frames
//! with and without their own execution context.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use reweave_core_types::{FrameId, SessionId, TargetId};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::bridge::DomBridge;
use crate::error::{BridgeError, BridgeErrorKind};
use crate::transport::{CdpTransport, CommandTarget};
use crate::types::{BoundingBox, FrameInfo, FrameSnapshot, NodeRef, QuerySession};

const SELECT_OPTION_FN: &str = r#"function(label) {
    const options = Array.from(this.options || []);
    const match = options.find(
        (option) => option.label === label || (option.textContent || '').trim() === label
    );
    if (!match) { return false; }
    this.value = match.value;
    this.dispatchEvent(new Event('input', { bubbles: true }));
    this.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
}"#;

const CLEAR_VALUE_FN: &str = "function() { if ('value' in this) { this.value = ''; } }";
const TEXT_CONTENT_FN: &str = "function() { return this.textContent || ''; }";

/// Bridge driving the browser with raw devtools commands over a pluggable
/// transport. Sessions are attached lazily per target and reused.
pub struct RawCdpBridge {
    transport: Arc<dyn CdpTransport>,
    focus_target: TargetId,
    sessions: DashMap<TargetId, SessionId>,
}

impl RawCdpBridge {
    pub fn new(transport: Arc<dyn CdpTransport>, focus_target: TargetId) -> Self {
        Self {
            transport,
            focus_target,
            sessions: DashMap::new(),
        }
    }

    async fn send(
        &self,
        session: &SessionId,
        method: &str,
        params: Value,
    ) -> Result<Value, BridgeError> {
        self.transport
            .send_command(CommandTarget::Session(session.0.clone()), method, params)
            .await
    }

    async fn send_browser(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        self.transport
            .send_command(CommandTarget::Browser, method, params)
            .await
    }

    async fn resolve_object(&self, node: &NodeRef) -> Result<String, BridgeError> {
        let resolved = self
            .send(
                &node.session_id,
                "DOM.resolveNode",
                json!({ "backendNodeId": node.backend_node_id }),
            )
            .await?;
        resolved
            .pointer("/object/objectId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                BridgeError::new(BridgeErrorKind::NodeGone)
                    .with_hint(format!("node {} has no remote object", node.backend_node_id))
            })
    }

    async fn call_function_on(
        &self,
        node: &NodeRef,
        declaration: &str,
        arguments: Vec<Value>,
    ) -> Result<Value, BridgeError> {
        let object_id = self.resolve_object(node).await?;
        let result = self
            .send(
                &node.session_id,
                "Runtime.callFunctionOn",
                json!({
                    "objectId": object_id,
                    "functionDeclaration": declaration,
                    "arguments": arguments,
                    "returnByValue": true,
                }),
            )
            .await?;
        Ok(result
            .pointer("/result/value")
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, BridgeError> {
        let session = self.focus_session().await?;
        let result = self
            .send(
                &session.session_id,
                "Runtime.evaluate",
                json!({ "expression": expression, "returnByValue": true }),
            )
            .await?;
        Ok(result
            .pointer("/result/value")
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn dispatch_mouse(&self, node: &NodeRef, kind: &str, x: f64, y: f64) -> Result<(), BridgeError> {
        self.send(
            &node.session_id,
            "Input.dispatchMouseEvent",
            json!({
                "type": kind,
                "x": x,
                "y": y,
                "button": "left",
                "clickCount": 1,
            }),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl DomBridge for RawCdpBridge {
    async fn frame_tree(&self) -> Result<FrameSnapshot, BridgeError> {
        let session = self.focus_session().await?;
        let payload = self
            .send(&session.session_id, "Page.getFrameTree", json!({}))
            .await?;
        let tree: FrameTreePayload = serde_json::from_value(payload).map_err(|err| {
            BridgeError::new(BridgeErrorKind::Internal)
                .with_hint(format!("malformed frame tree payload: {err}"))
        })?;

        let mut snapshot = FrameSnapshot::default();
        collect_frames(&tree.frame_tree, None, &mut snapshot);

        // The root frame runs in the focused target. Out-of-process iframes
        // surface as dedicated targets whose target id equals the frame id.
        if let Some(root) = snapshot
            .frames
            .values_mut()
            .find(|info| info.parent_id.is_none())
        {
            root.target_id = Some(self.focus_target.clone());
        }
        match self.send_browser("Target.getTargets", json!({})).await {
            Ok(targets) => {
                if let Ok(targets) = serde_json::from_value::<TargetsPayload>(targets) {
                    for info in targets.target_infos {
                        if info.target_type != "iframe" {
                            continue;
                        }
                        let frame_id = FrameId(info.target_id.clone());
                        if let Some(frame) = snapshot.frames.get_mut(&frame_id) {
                            frame.target_id = Some(TargetId(info.target_id));
                        }
                    }
                }
            }
            Err(err) => debug!("failed to enumerate targets: {err}"),
        }

        Ok(snapshot)
    }

    async fn focus_session(&self) -> Result<QuerySession, BridgeError> {
        let target = self.focus_target.clone();
        self.open_session(&target).await
    }

    async fn open_session(&self, target: &TargetId) -> Result<QuerySession, BridgeError> {
        if let Some(session) = self.sessions.get(target) {
            return Ok(QuerySession::new(session.clone(), target.clone()));
        }

        let attached = self
            .send_browser(
                "Target.attachToTarget",
                json!({ "targetId": target.0, "flatten": true }),
            )
            .await?;
        let session_id = attached
            .get("sessionId")
            .and_then(Value::as_str)
            .map(SessionId::from)
            .ok_or_else(|| {
                BridgeError::new(BridgeErrorKind::SessionUnavailable)
                    .with_hint(format!("attach to target {target} returned no session"))
            })?;

        self.sessions.insert(target.clone(), session_id.clone());
        Ok(QuerySession::new(session_id, target.clone()))
    }

    async fn query_selector(
        &self,
        session: &QuerySession,
        frame: Option<&FrameId>,
        selector: &str,
    ) -> Result<Option<NodeRef>, BridgeError> {
        let mut params = json!({ "depth": 1 });
        if let Some(frame) = frame {
            params["frameId"] = json!(frame.0);
        }

        let document = match self
            .send(&session.session_id, "DOM.getDocument", params)
            .await
        {
            Ok(document) => document,
            Err(err) => {
                // Frame-scoped document retrieval is not supported for every
                // session; retry against the default document.
                debug!(frame = ?frame, "frame-scoped getDocument failed, retrying unscoped: {err}");
                self.send(&session.session_id, "DOM.getDocument", json!({}))
                    .await?
            }
        };

        let root_node_id = match document.pointer("/root/nodeId").and_then(Value::as_u64) {
            Some(id) => id,
            None => return Ok(None),
        };

        let query = self
            .send(
                &session.session_id,
                "DOM.querySelector",
                json!({ "nodeId": root_node_id, "selector": selector }),
            )
            .await?;
        let node_id = match query.get("nodeId").and_then(Value::as_u64) {
            Some(id) if id != 0 => id,
            _ => return Ok(None),
        };

        let described = self
            .send(
                &session.session_id,
                "DOM.describeNode",
                json!({ "nodeId": node_id }),
            )
            .await?;
        Ok(described
            .pointer("/node/backendNodeId")
            .and_then(Value::as_u64)
            .map(|backend_node_id| NodeRef {
                backend_node_id,
                session_id: session.session_id.clone(),
            }))
    }

    async fn bounding_box(&self, node: &NodeRef) -> Result<Option<BoundingBox>, BridgeError> {
        let model = match self
            .send(
                &node.session_id,
                "DOM.getBoxModel",
                json!({ "backendNodeId": node.backend_node_id }),
            )
            .await
        {
            Ok(model) => model,
            Err(err) => {
                // The protocol reports "no box model" for nodes without
                // layout as a command error.
                debug!(
                    backend_node_id = node.backend_node_id,
                    "box model unavailable: {err}"
                );
                return Ok(None);
            }
        };

        let width = model.pointer("/model/width").and_then(Value::as_f64);
        let height = model.pointer("/model/height").and_then(Value::as_f64);
        let content = model.pointer("/model/content").and_then(Value::as_array);
        match (width, height, content) {
            (Some(width), Some(height), Some(content)) => {
                let x = content.first().and_then(Value::as_f64).unwrap_or(0.0);
                let y = content.get(1).and_then(Value::as_f64).unwrap_or(0.0);
                Ok(Some(BoundingBox {
                    x,
                    y,
                    width,
                    height,
                }))
            }
            _ => Ok(None),
        }
    }

    async fn click(&self, node: &NodeRef) -> Result<(), BridgeError> {
        let bounds = self.bounding_box(node).await?.ok_or_else(|| {
            BridgeError::new(BridgeErrorKind::NodeGone).with_hint("no box model to click")
        })?;
        let (x, y) = bounds.center();
        self.dispatch_mouse(node, "mousePressed", x, y).await?;
        self.dispatch_mouse(node, "mouseReleased", x, y).await
    }

    async fn fill(&self, node: &NodeRef, value: &str) -> Result<(), BridgeError> {
        self.focus(node).await?;
        self.call_function_on(node, CLEAR_VALUE_FN, Vec::new())
            .await?;
        self.send(
            &node.session_id,
            "Input.insertText",
            json!({ "text": value }),
        )
        .await
        .map(|_| ())
    }

    async fn select_option(&self, node: &NodeRef, label: &str) -> Result<(), BridgeError> {
        let selected = self
            .call_function_on(node, SELECT_OPTION_FN, vec![json!({ "value": label })])
            .await?;
        if selected.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(BridgeError::new(BridgeErrorKind::OptionNotFound)
                .with_hint(format!("no option labelled {label:?}")))
        }
    }

    async fn focus(&self, node: &NodeRef) -> Result<(), BridgeError> {
        self.send(
            &node.session_id,
            "DOM.focus",
            json!({ "backendNodeId": node.backend_node_id }),
        )
        .await
        .map(|_| ())
    }

    async fn press_key(&self, session: &QuerySession, key: &str) -> Result<(), BridgeError> {
        self.send(
            &session.session_id,
            "Input.dispatchKeyEvent",
            json!({ "type": "keyDown", "key": key }),
        )
        .await?;
        self.send(
            &session.session_id,
            "Input.dispatchKeyEvent",
            json!({ "type": "keyUp", "key": key }),
        )
        .await
        .map(|_| ())
    }

    async fn navigate(&self, url: &str) -> Result<(), BridgeError> {
        let session = self.focus_session().await?;
        self.send(&session.session_id, "Page.navigate", json!({ "url": url }))
            .await
            .map(|_| ())
    }

    async fn current_url(&self) -> Result<Option<String>, BridgeError> {
        let value = self.evaluate("window.location.href").await?;
        Ok(value
            .as_str()
            .filter(|url| !url.is_empty())
            .map(str::to_string))
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<(), BridgeError> {
        self.evaluate(&format!("window.scrollBy({dx}, {dy});"))
            .await
            .map(|_| ())
    }

    async fn text_content(&self, node: &NodeRef) -> Result<String, BridgeError> {
        let value = self.call_function_on(node, TEXT_CONTENT_FN, Vec::new()).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn page_text(&self) -> Result<String, BridgeError> {
        let value = self
            .evaluate("document.body ? document.body.innerText : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

fn collect_frames(node: &FrameTreeNode, parent: Option<&FrameId>, snapshot: &mut FrameSnapshot) {
    let frame_id = FrameId(node.frame.id.clone());
    let parent_id = node
        .frame
        .parent_id
        .clone()
        .map(FrameId)
        .or_else(|| parent.cloned());
    let child_ids = node
        .child_frames
        .iter()
        .map(|child| FrameId(child.frame.id.clone()))
        .collect();

    snapshot.insert(FrameInfo {
        frame_id: frame_id.clone(),
        target_id: None,
        url: node.frame.url.clone(),
        parent_id,
        child_ids,
    });

    for child in &node.child_frames {
        collect_frames(child, Some(&frame_id), snapshot);
    }
}

#[derive(Debug, Deserialize)]
struct FrameTreePayload {
    #[serde(rename = "frameTree")]
    frame_tree: FrameTreeNode,
}

#[derive(Debug, Deserialize)]
struct FrameTreeNode {
    frame: FramePayload,
    #[serde(rename = "childFrames", default)]
    child_frames: Vec<FrameTreeNode>,
}

#[derive(Debug, Deserialize)]
struct FramePayload {
    id: String,
    url: Option<String>,
    #[serde(rename = "parentId")]
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TargetsPayload {
    #[serde(rename = "targetInfos")]
    target_infos: Vec<TargetInfoPayload>,
}

#[derive(Debug, Deserialize)]
struct TargetInfoPayload {
    #[serde(rename = "targetId")]
    target_id: String,
    #[serde(rename = "type")]
    target_type: String,
}
