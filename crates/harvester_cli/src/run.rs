use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use engine_logging::{engine_info, engine_warn};
use harvester_core::{
    parse_count_text, CancelToken, DifferenceResult, HarvestPolicy, ListKind, ReconcileOptions,
    VerificationPolicy,
};
use harvester_engine::{
    AuditSession, CapturedFollowGraph, CollectedList, HarvestConfig, HarvestError, Harvester,
    JitteredPacer, ListStore, NoPause, Pacer, ScrollContainer, SnapshotContainer,
};

use crate::cli::{Cli, Mode};

/// Runs the selected mode. `cancel` stops harvesting and verification at the
/// next iteration boundary; whatever was collected is still saved.
pub fn run(cli: &Cli, cancel: CancelToken) -> Result<()> {
    if cli.scroll_delay > 0.0 {
        execute(cli, JitteredPacer, cancel)
    } else {
        execute(cli, NoPause, cancel)
    }
}

fn execute<P: Pacer>(cli: &Cli, pacer: P, cancel: CancelToken) -> Result<()> {
    let harvester = Harvester::new(harvest_config(cli)?, pacer);
    let session = AuditSession::new(&cli.username, harvester, cancel)
        .with_store(ListStore::new(&cli.output_dir));

    match cli.mode() {
        Mode::FollowingOnly => {
            let collected = collect(&session, capture_dir(cli)?, ListKind::Following, cli)?;
            print_list(&collected);
        }
        Mode::FollowersOnly => {
            let collected = collect(&session, capture_dir(cli)?, ListKind::Followers, cli)?;
            print_list(&collected);
        }
        Mode::FullScan => {
            let capture = capture_dir(cli)?;
            let following = collect(&session, capture, ListKind::Following, cli)
                .map(|collected| collected.report.set);
            if session.is_cancelled() {
                engine_warn!("cancelled; followers not harvested, nothing reconciled");
                return Ok(());
            }
            let followers = collect(&session, capture, ListKind::Followers, cli)
                .map(|collected| collected.report.set);
            if session.is_cancelled() {
                engine_warn!("cancelled; both lists kept, nothing reconciled");
                return Ok(());
            }
            let mut result = session.reconcile(following, followers, reconcile_options(cli))?;
            verify_if_requested(&session, &mut result, cli)?;
            print_result(&result);
        }
        Mode::LoadFiles {
            following,
            followers,
        } => {
            let following = ListStore::load_set(&following, ListKind::Following)
                .with_context(|| format!("loading {}", following.display()))?;
            let followers = ListStore::load_set(&followers, ListKind::Followers)
                .with_context(|| format!("loading {}", followers.display()))?;
            let mut result =
                session.reconcile(Ok(following), Ok(followers), reconcile_options(cli))?;
            verify_if_requested(&session, &mut result, cli)?;
            print_result(&result);
        }
    }
    Ok(())
}

fn harvest_config(cli: &Cli) -> Result<HarvestConfig> {
    if !cli.scroll_delay.is_finite() || cli.scroll_delay < 0.0 {
        bail!("--scroll-delay must be a non-negative number of seconds");
    }
    Ok(HarvestConfig {
        policy: HarvestPolicy {
            max_iterations: cli.max_iterations,
            stable_threshold: cli.stable_threshold,
            ..HarvestPolicy::default()
        },
        scroll_delay: Duration::from_secs_f64(cli.scroll_delay),
        ..HarvestConfig::default()
    })
}

fn reconcile_options(cli: &Cli) -> ReconcileOptions {
    ReconcileOptions {
        normalize: !cli.no_normalize,
        self_check: !cli.no_self_check,
    }
}

fn verification_policy(cli: &Cli) -> VerificationPolicy {
    VerificationPolicy {
        restricted_as_non_follower: !cli.no_restricted_as_non_follower,
        undetermined_as_confirmed: !cli.no_undetermined_as_confirmed,
    }
}

fn capture_dir(cli: &Cli) -> Result<&Path> {
    cli.capture_dir
        .as_deref()
        .context("--capture-dir is required unless --load-files is used")
}

fn expected_count(cli: &Cli, kind: ListKind) -> Option<u64> {
    let text = match kind {
        ListKind::Following => cli.following_count.as_deref(),
        ListKind::Followers => cli.followers_count.as_deref(),
    }?;
    let parsed = parse_count_text(text);
    if parsed.is_none() {
        engine_warn!("ignoring unreadable {} count {:?}", kind, text);
    }
    parsed
}

fn collect<P: Pacer>(
    session: &AuditSession<P>,
    capture: &Path,
    kind: ListKind,
    cli: &Cli,
) -> Result<CollectedList, HarvestError> {
    let mut dialog = open_view(&capture.join(kind.label()));
    let page_dir = capture.join(format!("{}_page", kind.label()));
    let mut page = page_dir.is_dir().then(|| open_view(&page_dir));
    session.collect(
        kind,
        &mut dialog,
        page.as_mut().map(|view| view as &mut dyn ScrollContainer),
        expected_count(cli, kind),
    )
}

/// A view that cannot be read replays as an empty capture, which the harvester
/// reports as unavailable.
fn open_view(dir: &Path) -> SnapshotContainer {
    SnapshotContainer::from_dir(dir).unwrap_or_else(|err| {
        engine_warn!("{}", err);
        SnapshotContainer::from_frames(dir.display().to_string(), Vec::<String>::new())
    })
}

fn verify_if_requested<P: Pacer>(
    session: &AuditSession<P>,
    result: &mut DifferenceResult,
    cli: &Cli,
) -> Result<()> {
    if !cli.verify {
        return Ok(());
    }
    let Some(path) = cli.verify_graph.as_deref() else {
        engine_warn!("--verify needs --verify-graph to answer lookups; skipping verification");
        return Ok(());
    };
    let graph = CapturedFollowGraph::load(path)
        .with_context(|| format!("loading follow graph {}", path.display()))?;
    let mut lookup = graph.lookup_for(session.username());
    let outcome = session.verify(
        result,
        cli.verify_count,
        &mut lookup,
        verification_policy(cli),
        &mut rand::thread_rng(),
    );
    if let Some(accuracy) = outcome.accuracy() {
        println!(
            "Verification: {}/{} confirmed ({:.1}%)",
            outcome.confirmed(),
            outcome.sampled(),
            accuracy * 100.0
        );
    }
    Ok(())
}

fn print_list(collected: &CollectedList) {
    let report = &collected.report;
    println!(
        "{} {} collected in {} iterations ({}{})",
        report.set.len(),
        report.set.label(),
        report.iterations,
        report.stop_reason,
        if collected.used_fallback { ", page fallback" } else { "" }
    );
    if let Some(ratio) = report.set.achieved_ratio() {
        println!("{:.1}% of the expected count", ratio * 100.0);
    }
    if let Some(path) = &collected.saved_to {
        println!("Saved to {}", path.display());
    }
}

fn print_result(result: &DifferenceResult) {
    println!("{} accounts do not follow back:", result.len());
    for raw in result.members() {
        println!("  {raw}");
    }
    engine_info!("reconciliation finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(["harvester", "--username", "me"].iter().chain(args)).unwrap()
    }

    #[test]
    fn flags_map_onto_configuration() {
        let cli = cli(&[
            "--max-iterations",
            "50",
            "--stable-threshold",
            "4",
            "--scroll-delay",
            "0.5",
            "--no-normalize",
            "--no-undetermined-as-confirmed",
        ]);
        let config = harvest_config(&cli).unwrap();
        assert_eq!(config.policy.max_iterations, 50);
        assert_eq!(config.policy.stable_threshold, 4);
        assert_eq!(config.scroll_delay, Duration::from_millis(500));
        assert!(!reconcile_options(&cli).normalize);
        let policy = verification_policy(&cli);
        assert!(policy.restricted_as_non_follower);
        assert!(!policy.undetermined_as_confirmed);
    }

    #[test]
    fn negative_scroll_delay_is_rejected() {
        assert!(harvest_config(&cli(&["--scroll-delay=-1"])).is_err());
    }

    #[test]
    fn count_text_is_parsed_for_the_right_list() {
        let cli = cli(&["--following-count", "1.2K", "--followers-count", "n/a"]);
        assert_eq!(expected_count(&cli, ListKind::Following), Some(1200));
        assert_eq!(expected_count(&cli, ListKind::Followers), None);
    }

    #[test]
    fn load_files_mode_writes_non_followers() {
        let temp = TempDir::new().unwrap();
        let following = temp.path().join("following.json");
        let followers = temp.path().join("followers.json");
        fs::write(&following, r#"["alice", "Bob", "carol"]"#).unwrap();
        fs::write(&followers, r#"["bob"]"#).unwrap();
        let out = temp.path().join("out");

        let cli = cli(&[
            "--load-files",
            "--following-file",
            following.to_str().unwrap(),
            "--followers-file",
            followers.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
        ]);
        run(&cli, CancelToken::new()).unwrap();

        let written: Vec<_> = fs::read_dir(&out).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(written.len(), 1);
        let name = written[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("me_non_followers_"), "{name}");
        assert_eq!(
            ListStore::load(&written[0]).unwrap(),
            vec!["alice".to_string(), "carol".to_string()]
        );
    }

    #[test]
    fn scanning_without_capture_dir_fails() {
        assert!(run(
            &cli(&["--following-only", "--scroll-delay", "0"]),
            CancelToken::new()
        )
        .is_err());
    }

    #[test]
    fn cancelled_full_scan_keeps_following_and_stops() {
        let temp = TempDir::new().unwrap();
        let capture = temp.path().join("capture");
        for label in ["following", "followers"] {
            let dir = capture.join(label);
            fs::create_dir_all(&dir).unwrap();
            let rows: String = (0..8)
                .map(|i| format!("<a href=\"/{label}_{i}/\">x</a>"))
                .collect();
            fs::write(dir.join("001.html"), format!("<html><body>{rows}</body></html>")).unwrap();
        }
        let out = temp.path().join("out");
        let cli = cli(&[
            "--capture-dir",
            capture.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--scroll-delay",
            "0",
        ]);
        let cancel = CancelToken::new();
        cancel.cancel();
        run(&cli, cancel).unwrap();

        let written: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(written.len(), 1, "{written:?}");
        assert!(written[0].starts_with("me_following_"));
    }
}
