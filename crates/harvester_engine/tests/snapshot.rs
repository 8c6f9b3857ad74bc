mod support;

use std::fs;

use harvester_core::{CancelToken, ListKind, StopReason};
use harvester_engine::{
    ElementQuery, HarvestConfig, HarvestError, Harvester, NoPause, ScrollContainer,
    SnapshotContainer,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use support::{frame, init_logging, user};

#[test]
fn reaching_the_end_reveals_the_next_frame() {
    let mut container = SnapshotContainer::from_frames(
        "dialog",
        [frame((0..2).map(user)), frame((0..4).map(user))],
    );
    container.locate().unwrap();
    let first = container.content_extent().unwrap();

    container.scroll_to(first / 2).unwrap();
    assert_eq!(container.revealed(), 0);

    container.scroll_to(first).unwrap();
    assert_eq!(container.revealed(), 1);
    assert!(container.content_extent().unwrap() > first);

    // No frames left: extent stays put.
    let last = container.content_extent().unwrap();
    container.scroll_to(last + 1000).unwrap();
    assert_eq!(container.content_extent().unwrap(), last);
    assert_eq!(container.elements(ElementQuery::ProfileLinks).unwrap().len(), 4);
}

#[test]
fn text_scan_skips_scripts_and_keeps_own_text() {
    let html = r#"<html><body>
        <script>var a = "@not_a_user";</script>
        <div><span>@alice</span> follows <b>@bob</b></div>
    </body></html>"#;
    let mut container = SnapshotContainer::from_frames("dialog", [html]);
    let texts: Vec<String> = container
        .elements(ElementQuery::TextBearing)
        .unwrap()
        .into_iter()
        .filter_map(|e| e.text)
        .collect();
    assert!(texts.contains(&"@alice".to_string()));
    assert!(texts.contains(&"@bob".to_string()));
    assert!(texts.iter().all(|t| !t.contains("not_a_user")));
}

#[test]
fn link_like_query_includes_role_links() {
    let html = r#"<html><body>
        <a href="/alice/">alice</a>
        <div role="link" href="/bob/">bob</div>
        <span>carol</span>
    </body></html>"#;
    let mut container = SnapshotContainer::from_frames("dialog", [html]);
    assert_eq!(container.elements(ElementQuery::ProfileLinks).unwrap().len(), 1);
    assert_eq!(container.elements(ElementQuery::LinkLike).unwrap().len(), 2);
}

#[test]
fn frames_load_from_directory_in_name_order() {
    init_logging();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("002.html"), frame((0..60).map(user))).unwrap();
    fs::write(dir.path().join("001.html"), frame((0..30).map(user))).unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let mut container = SnapshotContainer::from_dir(dir.path()).unwrap();
    assert_eq!(container.frame_count(), 2);
    assert_eq!(container.elements(ElementQuery::ProfileLinks).unwrap().len(), 30);

    let report = Harvester::new(HarvestConfig::default(), NoPause)
        .harvest(&mut container, ListKind::Following, Some(60), &CancelToken::new())
        .unwrap()
        .into_report();
    assert_eq!(report.set.len(), 60);
    assert_eq!(report.stop_reason, StopReason::TargetReached);
}

#[test]
fn empty_capture_cannot_be_located() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut container = SnapshotContainer::from_dir(dir.path()).unwrap();
    let err = Harvester::new(HarvestConfig::default(), NoPause)
        .harvest(&mut container, ListKind::Followers, None, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, HarvestError::SourceUnavailable { .. }));
}

#[test]
fn missing_capture_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(SnapshotContainer::from_dir(&dir.path().join("absent")).is_err());
}
