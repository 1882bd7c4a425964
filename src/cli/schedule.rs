use anyhow::Result;
use console::style;

use super::{flag_list, flag_value, has_flag};
use crate::core::bootstrap::App;
use crate::core::config::Config;
use crate::core::store::types::{AssetKind, Frequency, NewSchedule, SchedulePatch};
use crate::core::terminal::{print_error, print_info, print_success};

pub async fn run(args: &[String]) -> Result<()> {
    let sub = args.get(2).map(String::as_str).unwrap_or("");
    match sub {
        "create" => create(args).await,
        "list" => list().await,
        "toggle" => toggle(args).await,
        "set" => set(args).await,
        "run" => run_now(args).await,
        _ => {
            print_error("Usage: herald schedule <create|list|toggle|set|run>");
            Ok(())
        }
    }
}

fn parse_frequency(value: &str) -> Option<Frequency> {
    Frequency::from_frequency(value)
}

fn parse_kind(value: &str) -> Option<AssetKind> {
    AssetKind::from_kind(value)
}

async fn create(args: &[String]) -> Result<()> {
    let Some(name) = flag_value(args, 3, &["--name"]) else {
        print_error("Error: --name is required.");
        return Ok(());
    };
    let Some(user_id) = flag_value(args, 3, &["--user", "-u"]) else {
        print_error("Error: --user is required.");
        return Ok(());
    };
    let Some(frequency) = flag_value(args, 3, &["--frequency"])
        .as_deref()
        .and_then(parse_frequency)
    else {
        print_error("Error: --frequency must be daily, weekly, biweekly, or monthly.");
        return Ok(());
    };
    let kind = match flag_value(args, 3, &["--kind"]) {
        Some(raw) => match parse_kind(&raw) {
            Some(kind) => kind,
            None => {
                print_error(&format!("Error: unknown content kind {:?}.", raw));
                return Ok(());
            }
        },
        None => AssetKind::Blog,
    };

    let app = App::init(Config::from_env()?)?;
    let schedule = app
        .scheduler
        .create(NewSchedule {
            name,
            frequency,
            day_of_week: flag_value(args, 3, &["--day"]).and_then(|v| v.parse().ok()),
            time_of_day: flag_value(args, 3, &["--time"]).unwrap_or_else(|| "09:00".to_string()),
            kind,
            topics: flag_list(args, 3, &["--topics"]).unwrap_or_default(),
            auto_publish: has_flag(args, 3, &["--auto-publish"]),
            user_id,
        })
        .await?;

    print_success(&format!("Created schedule '{}'", schedule.name));
    if let Some(next_run) = schedule.next_run {
        print_info(&format!("First run: {}", next_run.to_rfc3339()));
    }
    Ok(())
}

async fn list() -> Result<()> {
    let app = App::init(Config::from_env()?)?;
    let schedules = app.scheduler.get_all().await?;
    if schedules.is_empty() {
        print_info("No schedules yet. Create one with: herald schedule create");
        return Ok(());
    }
    for schedule in schedules {
        let next = schedule
            .next_run
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:<8} {:<9} {}  next: {}  ({})",
            schedule.status.as_str(),
            schedule.frequency.as_str(),
            style(&schedule.name).bold(),
            next,
            schedule.id
        );
    }
    Ok(())
}

async fn toggle(args: &[String]) -> Result<()> {
    let (Some(id), Some(state)) = (args.get(3), args.get(4)) else {
        print_error("Usage: herald schedule toggle <id> <on|off>");
        return Ok(());
    };
    let enabled = match state.as_str() {
        "on" => true,
        "off" => false,
        _ => {
            print_error("Usage: herald schedule toggle <id> <on|off>");
            return Ok(());
        }
    };

    let app = App::init(Config::from_env()?)?;
    app.scheduler.toggle(id, enabled).await?;
    print_success(&format!(
        "Schedule {}",
        if enabled { "resumed" } else { "paused" }
    ));
    Ok(())
}

async fn set(args: &[String]) -> Result<()> {
    let Some(id) = args.get(3).filter(|a| !a.starts_with('-')).cloned() else {
        print_error("Usage: herald schedule set <id> [--time HH:MM] [--frequency f] [--day n] [--topics a,b]");
        return Ok(());
    };

    let patch = SchedulePatch {
        name: flag_value(args, 4, &["--name"]),
        frequency: flag_value(args, 4, &["--frequency"])
            .as_deref()
            .and_then(parse_frequency),
        day_of_week: flag_value(args, 4, &["--day"]).map(|v| v.parse().ok()),
        time_of_day: flag_value(args, 4, &["--time"]),
        kind: flag_value(args, 4, &["--kind"]).as_deref().and_then(parse_kind),
        topics: flag_list(args, 4, &["--topics"]),
        auto_publish: None,
    };

    let app = App::init(Config::from_env()?)?;
    let updated = app.scheduler.update(&id, patch).await?;
    print_success(&format!("Updated schedule '{}'", updated.name));
    if let Some(next_run) = updated.next_run {
        print_info(&format!("Next run: {}", next_run.to_rfc3339()));
    }
    Ok(())
}

async fn run_now(args: &[String]) -> Result<()> {
    let Some(id) = args.get(3) else {
        print_error("Usage: herald schedule run <id>");
        return Ok(());
    };

    let app = App::init(Config::from_env()?)?;
    let status = app.scheduler.execute(id).await?;
    print_success(&format!("Schedule executed (status: {})", status.as_str()));
    Ok(())
}
