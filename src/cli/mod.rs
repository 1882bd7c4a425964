mod asset;
mod campaign;
mod channel;
mod daemon;
mod publish_cmd;
mod schedule;

use anyhow::Result;
use console::style;

use crate::core::terminal::{self, GuideSection, print_error};

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Campaigns")
        .command("campaign", "Create, run, and inspect campaigns")
        .command("asset", "Show, edit, and version content assets")
        .command("publish", "Publish a stored asset to a platform")
        .print();

    GuideSection::new("Connections")
        .command("channel", "Connect and disconnect platform accounts")
        .print();

    GuideSection::new("Automation")
        .command("schedule", "Manage recurring content schedules")
        .command("daemon", "Run the scheduler loop in the foreground")
        .print();

    println!(
        "\n {} {} <command> [subcommand] [flags]\n",
        style("Usage:").bold(),
        style("herald").green()
    );
}

/// Value of the first flag in `names`, scanning from `start`.
pub(crate) fn flag_value(args: &[String], start: usize, names: &[&str]) -> Option<String> {
    let mut i = start;
    while i < args.len() {
        if names.contains(&args[i].as_str()) && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

pub(crate) fn has_flag(args: &[String], start: usize, names: &[&str]) -> bool {
    args[start..]
        .iter()
        .any(|a| names.contains(&a.as_str()))
}

/// Comma-separated flag value, trimmed and de-emptied.
pub(crate) fn flag_list(args: &[String], start: usize, names: &[&str]) -> Option<Vec<String>> {
    flag_value(args, start, names).map(|value| {
        value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let verbose = has_flag(&args, 1, &["--verbose", "-v"]);
    crate::logging::init(verbose);

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "campaign" => campaign::run(&args).await,
        "asset" => asset::run(&args).await,
        "channel" => channel::run(&args).await,
        "publish" => publish_cmd::run(&args).await,
        "schedule" => schedule::run(&args).await,
        "daemon" => daemon::run().await,
        other => {
            print_error(&format!("Unknown command: {}", other));
            print_help();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flag_value_finds_the_first_match() {
        let a = args(&["herald", "campaign", "create", "--title", "Launch", "-t", "Other"]);
        assert_eq!(
            flag_value(&a, 2, &["--title", "-t"]).as_deref(),
            Some("Launch")
        );
        assert_eq!(flag_value(&a, 2, &["--missing"]), None);
    }

    #[test]
    fn trailing_flag_without_a_value_is_ignored() {
        let a = args(&["herald", "campaign", "create", "--title"]);
        assert_eq!(flag_value(&a, 2, &["--title"]), None);
    }

    #[test]
    fn flag_list_splits_and_trims() {
        let a = args(&["herald", "x", "--channels", "blog, social,,email"]);
        assert_eq!(
            flag_list(&a, 1, &["--channels"]).unwrap(),
            vec!["blog", "social", "email"]
        );
    }

    #[test]
    fn has_flag_scans_from_start() {
        let a = args(&["herald", "daemon", "--verbose"]);
        assert!(has_flag(&a, 1, &["--verbose", "-v"]));
        assert!(!has_flag(&a, 1, &["--quiet"]));
    }
}
