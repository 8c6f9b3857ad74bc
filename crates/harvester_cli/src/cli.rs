use std::path::PathBuf;

use clap::{Args, Parser};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Collect following/followers lists and report accounts that do not follow back"
)]
pub struct Cli {
    #[arg(long, help = "Account whose lists are audited")]
    pub username: String,

    #[command(flatten)]
    pub mode: ModeArgs,

    #[arg(long, help = "Saved following list (JSON array) for --load-files")]
    pub following_file: Option<PathBuf>,
    #[arg(long, help = "Saved followers list (JSON array) for --load-files")]
    pub followers_file: Option<PathBuf>,

    #[arg(
        long,
        help = "Captured list frames: following/, followers/ and optional *_page/ views"
    )]
    pub capture_dir: Option<PathBuf>,

    #[arg(long, help = "Displayed following count, e.g. \"1,234\" or \"1.2K\"")]
    pub following_count: Option<String>,
    #[arg(long, help = "Displayed followers count, e.g. \"1,234\" or \"1.2K\"")]
    pub followers_count: Option<String>,

    #[arg(long, default_value_t = 1000)]
    pub max_iterations: u64,
    #[arg(long, default_value_t = 10)]
    pub stable_threshold: u32,
    #[arg(long, default_value_t = 2.0, help = "Base pause after each scroll, in seconds")]
    pub scroll_delay: f64,

    #[arg(long, help = "Re-check a random sample of the result")]
    pub verify: bool,
    #[arg(long, default_value_t = 5)]
    pub verify_count: usize,
    #[arg(long, help = "Captured follow graph (JSON) answering verification lookups")]
    pub verify_graph: Option<PathBuf>,

    #[arg(long, help = "Compare exact strings only")]
    pub no_normalize: bool,
    #[arg(long, help = "Keep entries whose canonical form is among the followers")]
    pub no_self_check: bool,
    #[arg(long, help = "Do not count restricted accounts as confirmed")]
    pub no_restricted_as_non_follower: bool,
    #[arg(long, help = "Do not count undetermined lookups as confirmed")]
    pub no_undetermined_as_confirmed: bool,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    #[arg(short, long, help = "Debug logging")]
    pub verbose: bool,
}

#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct ModeArgs {
    #[arg(long, help = "Harvest both lists and reconcile (default)")]
    pub full_scan: bool,
    #[arg(long)]
    pub following_only: bool,
    #[arg(long)]
    pub followers_only: bool,
    #[arg(
        long,
        requires = "following_file",
        requires = "followers_file",
        help = "Reconcile previously saved lists"
    )]
    pub load_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    FullScan,
    FollowingOnly,
    FollowersOnly,
    LoadFiles {
        following: PathBuf,
        followers: PathBuf,
    },
}

impl Cli {
    pub fn mode(&self) -> Mode {
        match (&self.following_file, &self.followers_file) {
            (Some(following), Some(followers)) if self.mode.load_files => Mode::LoadFiles {
                following: following.clone(),
                followers: followers.clone(),
            },
            _ if self.mode.following_only => Mode::FollowingOnly,
            _ if self.mode.followers_only => Mode::FollowersOnly,
            _ => Mode::FullScan,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(["harvester", "--username", "me"].iter().chain(args))
    }

    #[test]
    fn full_scan_is_the_default() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.mode(), Mode::FullScan);
        assert_eq!(cli.max_iterations, 1000);
        assert_eq!(cli.stable_threshold, 10);
        assert_eq!(cli.verify_count, 5);
        assert_eq!(cli.log_level(), LevelFilter::Info);
    }

    #[test]
    fn load_files_needs_both_paths() {
        assert!(parse(&["--load-files", "--following-file", "a.json"]).is_err());
        let cli = parse(&[
            "--load-files",
            "--following-file",
            "a.json",
            "--followers-file",
            "b.json",
        ])
        .unwrap();
        assert_eq!(
            cli.mode(),
            Mode::LoadFiles {
                following: "a.json".into(),
                followers: "b.json".into(),
            }
        );
    }

    #[test]
    fn modes_are_mutually_exclusive() {
        assert!(parse(&["--following-only", "--followers-only"]).is_err());
        assert_eq!(
            parse(&["--followers-only", "-v"]).unwrap().mode(),
            Mode::FollowersOnly
        );
    }
}
