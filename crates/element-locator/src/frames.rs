//! Frame tree resolution and frame URL scoring.
//!
//! The frame tree carries no identifier that is stable across page loads,
//! so the resolver works from two degradable signals: a recorded
//! child-index path (fragile under DOM mutation, every hop bounds-checked)
//! and a recorded frame URL (matched by [`score_frame_url`]). Losing frame
//! isolation is an accepted degradation; failing the locate call is not.

use cdp_bridge::{DomBridge, FrameInfo, FrameSnapshot, QuerySession};
use reweave_core_types::{FrameId, TargetId};
use tracing::debug;
use url::Url;

use crate::errors::LocatorError;
use crate::types::{FrameScope, LocateHints};

/// Similarity of a candidate frame URL to a target URL.
///
/// Pure function of the two strings: +2 when scheme and authority match,
/// +1 more when the candidate path starts with the target path, and an
/// independent +1 when the candidate string literally starts with the
/// target string. Unparsable or missing URLs score 0; the maximum is 4.
pub fn score_frame_url(candidate: Option<&str>, target: Option<&str>) -> u32 {
    let (Some(candidate_raw), Some(target_raw)) = (candidate, target) else {
        return 0;
    };
    let (Ok(candidate), Ok(target)) = (Url::parse(candidate_raw), Url::parse(target_raw)) else {
        return 0;
    };

    let mut score = 0;
    if candidate.scheme() == target.scheme() && candidate.authority() == target.authority() {
        score += 2;
        if candidate.path().starts_with(target.path()) {
            score += 1;
        }
    }
    if candidate_raw.starts_with(target_raw) {
        score += 1;
    }
    score
}

/// Parse a recorded frame path into child indices.
///
/// The leading numeral only marks "this is a root-anchored path" and is
/// dropped; `"0"` and the empty string mean "stay at root". Unparsable
/// segments are skipped rather than failing the whole path.
pub fn parse_frame_path(path: Option<&str>) -> Vec<usize> {
    let Some(path) = path else {
        return Vec::new();
    };
    let segments: Vec<&str> = path
        .split('.')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    let mut indices = Vec::new();
    for part in segments.iter().skip(1) {
        match part.parse::<usize>() {
            Ok(index) => indices.push(index),
            Err(_) => debug!("skipping invalid frame path segment: {part}"),
        }
    }
    indices
}

/// Root of the snapshot: prefer a parentless frame owned by the focused
/// target, else any parentless frame, else the first entry. Never fails on
/// a structurally unusual snapshot.
pub fn find_root_frame<'a>(
    snapshot: &'a FrameSnapshot,
    focus_target: Option<&TargetId>,
) -> Option<(FrameId, &'a FrameInfo)> {
    if snapshot.is_empty() {
        return None;
    }

    if let Some(focus) = focus_target {
        if let Some((id, info)) = snapshot
            .frames
            .iter()
            .find(|(_, info)| info.parent_id.is_none() && info.target_id.as_ref() == Some(focus))
        {
            return Some((id.clone(), info));
        }
    }

    if let Some((id, info)) = snapshot
        .frames
        .iter()
        .find(|(_, info)| info.parent_id.is_none())
    {
        return Some((id.clone(), info));
    }

    snapshot
        .frames
        .iter()
        .next()
        .map(|(id, info)| (id.clone(), info))
}

/// Walk child-index hops from the root. Any out-of-range index aborts the
/// walk; the caller falls back to the best-known frame instead.
pub fn follow_frame_path<'a>(
    snapshot: &'a FrameSnapshot,
    root: &FrameId,
    indices: &[usize],
) -> Option<(FrameId, &'a FrameInfo)> {
    let mut current_id = root.clone();
    let mut current = snapshot.frames.get(&current_id)?;

    for &index in indices {
        match current.child_ids.get(index) {
            Some(child_id) => {
                current_id = child_id.clone();
                current = snapshot.frames.get(&current_id)?;
            }
            None => {
                debug!("frame path index {index} out of range for frame {current_id}");
                return None;
            }
        }
    }
    Some((current_id, current))
}

/// Re-score every frame against `prefer_url` and switch away from the
/// current selection only on a strictly higher score.
pub fn find_best_frame_by_url<'a>(
    snapshot: &'a FrameSnapshot,
    prefer_url: &str,
    current: Option<(FrameId, &'a FrameInfo)>,
) -> Option<(FrameId, &'a FrameInfo)> {
    let mut best = current;
    let mut best_score = best
        .as_ref()
        .map(|(_, info)| score_frame_url(info.url.as_deref(), Some(prefer_url)))
        .unwrap_or(0);

    for (id, info) in &snapshot.frames {
        let score = score_frame_url(info.url.as_deref(), Some(prefer_url));
        if score > best_score {
            best = Some((id.clone(), info));
            best_score = score;
        }
    }
    best
}

/// Open a frame-specific session for the selected frame, degrading to the
/// caller's focus session when acquisition fails.
async fn build_frame_scope(
    bridge: &dyn DomBridge,
    selected: Option<(FrameId, FrameInfo)>,
    fallback: &QuerySession,
) -> FrameScope {
    let (frame_id, frame) = match selected {
        Some((id, info)) => (Some(id), Some(info)),
        None => (None, None),
    };

    let session = match frame.as_ref().and_then(|info| info.target_id.clone()) {
        Some(target) => match bridge.open_session(&target).await {
            Ok(session) => session,
            Err(err) => {
                debug!(
                    frame = ?frame_id,
                    target = %target,
                    "failed to open frame session, using focus session: {err}"
                );
                fallback.clone()
            }
        },
        None => fallback.clone(),
    };

    FrameScope::new(frame_id, frame, session)
}

/// Resolve the primary search scope for one locate call.
///
/// Returns the scope together with the snapshot it was resolved from, so
/// the fallback scan can enumerate the remaining frames without re-fetching.
pub async fn resolve_scope(
    bridge: &dyn DomBridge,
    hints: &LocateHints,
) -> Result<(FrameScope, FrameSnapshot), LocatorError> {
    let focus = bridge.focus_session().await?;

    let snapshot = match bridge.frame_tree().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            debug!("failed to collect frame hierarchy: {err}");
            FrameSnapshot::default()
        }
    };

    let root = find_root_frame(&snapshot, Some(&focus.target_id));

    let indices = parse_frame_path(hints.frame_path.as_deref());
    let mut selected = if indices.is_empty() {
        root.clone()
    } else {
        root.as_ref()
            .and_then(|(root_id, _)| follow_frame_path(&snapshot, root_id, &indices))
    };

    if let Some(prefer_url) = hints.frame_url.as_deref() {
        selected = find_best_frame_by_url(&snapshot, prefer_url, selected);
    }

    if selected.is_none() {
        selected = root;
    }

    let selected = selected.map(|(id, info)| (id, info.clone()));
    let scope = build_frame_scope(bridge, selected, &focus).await;
    Ok((scope, snapshot))
}

/// Every frame in the snapshot except the primary one, as scopes, ordered
/// by descending URL score against `prefer_url` (arbitrary when no hint is
/// available).
pub async fn collect_other_scopes(
    bridge: &dyn DomBridge,
    snapshot: &FrameSnapshot,
    primary: Option<&FrameId>,
    prefer_url: Option<&str>,
) -> Result<Vec<FrameScope>, LocatorError> {
    if snapshot.is_empty() {
        return Ok(Vec::new());
    }

    let focus = bridge.focus_session().await?;

    let mut ranked: Vec<(&FrameId, &FrameInfo)> = snapshot
        .frames
        .iter()
        .filter(|(id, _)| Some(*id) != primary)
        .collect();
    ranked.sort_by_key(|(_, info)| std::cmp::Reverse(score_frame_url(info.url.as_deref(), prefer_url)));

    let mut scopes = Vec::with_capacity(ranked.len());
    for (id, info) in ranked {
        let scope = build_frame_scope(bridge, Some((id.clone(), info.clone())), &focus).await;
        scopes.push(scope);
    }
    Ok(scopes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: &str, url: Option<&str>, parent: Option<&str>, children: &[&str]) -> FrameInfo {
        FrameInfo {
            frame_id: FrameId::from(id),
            target_id: None,
            url: url.map(str::to_string),
            parent_id: parent.map(FrameId::from),
            child_ids: children.iter().map(|c| FrameId::from(*c)).collect(),
        }
    }

    fn snapshot(frames: Vec<FrameInfo>) -> FrameSnapshot {
        let mut snapshot = FrameSnapshot::default();
        for info in frames {
            snapshot.insert(info);
        }
        snapshot
    }

    #[test]
    fn scoring_is_monotonic_in_match_quality() {
        let target = Some("https://app.example.com/login");
        let full = score_frame_url(Some("https://app.example.com/login#step2"), target);
        let host_only = score_frame_url(Some("https://app.example.com/other"), target);
        let unrelated = score_frame_url(Some("https://ads.example.net/"), target);

        assert_eq!(full, 4);
        assert_eq!(host_only, 2);
        assert_eq!(unrelated, 0);
        assert!(full > host_only && host_only > unrelated);
    }

    #[test]
    fn unparsable_or_missing_urls_score_zero() {
        assert_eq!(score_frame_url(None, Some("https://a.example/")), 0);
        assert_eq!(score_frame_url(Some("https://a.example/"), None), 0);
        assert_eq!(score_frame_url(Some("not a url"), Some("https://a.example/")), 0);
    }

    #[test]
    fn frame_path_zero_or_empty_stays_at_root() {
        assert!(parse_frame_path(None).is_empty());
        assert!(parse_frame_path(Some("")).is_empty());
        assert!(parse_frame_path(Some("0")).is_empty());
    }

    #[test]
    fn frame_path_drops_leading_marker_and_bad_segments() {
        assert_eq!(parse_frame_path(Some("0.1.2")), vec![1, 2]);
        assert_eq!(parse_frame_path(Some("0. 1 .x.3")), vec![1, 3]);
    }

    #[test]
    fn root_selection_prefers_focused_target() {
        let mut focused = frame("root-a", Some("https://a.example/"), None, &[]);
        focused.target_id = Some(TargetId::from("focus"));
        let other = frame("root-b", Some("https://b.example/"), None, &[]);
        let snapshot = snapshot(vec![other, focused]);

        let (id, _) = find_root_frame(&snapshot, Some(&TargetId::from("focus"))).unwrap();
        assert_eq!(id, FrameId::from("root-a"));
    }

    #[test]
    fn root_selection_never_fails_on_parentless_free_snapshot() {
        let snapshot = snapshot(vec![frame("orphan", None, Some("gone"), &[])]);
        let (id, _) = find_root_frame(&snapshot, None).unwrap();
        assert_eq!(id, FrameId::from("orphan"));
        assert!(find_root_frame(&FrameSnapshot::default(), None).is_none());
    }

    #[test]
    fn path_following_is_bounds_checked() {
        let snapshot = snapshot(vec![
            frame("root", None, None, &["child-0"]),
            frame("child-0", None, Some("root"), &[]),
        ]);

        let followed = follow_frame_path(&snapshot, &FrameId::from("root"), &[0]).unwrap();
        assert_eq!(followed.0, FrameId::from("child-0"));

        assert!(follow_frame_path(&snapshot, &FrameId::from("root"), &[3]).is_none());
        assert!(follow_frame_path(&snapshot, &FrameId::from("root"), &[0, 0]).is_none());
    }

    #[test]
    fn url_refinement_switches_only_on_strictly_higher_score() {
        let snapshot = snapshot(vec![
            frame("login", Some("https://app.example.com/login#step2"), None, &[]),
            frame("ads", Some("https://ads.example.net/"), Some("login"), &[]),
        ]);
        let prefer = "https://app.example.com/login";

        let current = snapshot
            .frames
            .get(&FrameId::from("ads"))
            .map(|info| (FrameId::from("ads"), info));
        let (best, _) = find_best_frame_by_url(&snapshot, prefer, current).unwrap();
        assert_eq!(best, FrameId::from("login"));

        // Equal score keeps the current selection.
        let current = snapshot
            .frames
            .get(&FrameId::from("login"))
            .map(|info| (FrameId::from("login"), info));
        let (kept, _) = find_best_frame_by_url(&snapshot, prefer, current).unwrap();
        assert_eq!(kept, FrameId::from("login"));
    }
}
