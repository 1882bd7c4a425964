use anyhow::Result;
use console::style;
use tokio_util::sync::CancellationToken;

use super::{flag_list, flag_value};
use crate::core::agents::DEFAULT_AGENT_ORDER;
use crate::core::bootstrap::App;
use crate::core::config::Config;
use crate::core::store::types::{NewCampaign, TaskStatus};
use crate::core::terminal::{print_error, print_info, print_status, print_success, print_warn};

pub async fn run(args: &[String]) -> Result<()> {
    let sub = args.get(2).map(String::as_str).unwrap_or("");
    match sub {
        "create" => create(args).await,
        "run" => run_agents(args).await,
        "show" => show(args).await,
        "list" => list().await,
        _ => {
            print_error("Usage: herald campaign <create|run|show|list>");
            Ok(())
        }
    }
}

async fn create(args: &[String]) -> Result<()> {
    let Some(title) = flag_value(args, 3, &["--title", "-t"]) else {
        print_error("Error: --title is required.");
        return Ok(());
    };
    let Some(objective) = flag_value(args, 3, &["--objective", "-o"]) else {
        print_error("Error: --objective is required.");
        return Ok(());
    };

    let app = App::init(Config::from_env()?)?;
    let campaign = app
        .store
        .create_campaign(NewCampaign {
            title,
            objective,
            audience: flag_value(args, 3, &["--audience"])
                .unwrap_or_else(|| "general audience".to_string()),
            brand_voice: flag_value(args, 3, &["--voice"])
                .unwrap_or_else(|| "clear and direct".to_string()),
            channels: flag_list(args, 3, &["--channels"])
                .unwrap_or_else(|| vec!["blog".to_string()]),
            target_length: flag_value(args, 3, &["--length"]).and_then(|v| v.parse().ok()),
        })
        .await?;

    print_success(&format!("Created campaign '{}'", campaign.title));
    print_status("id", &campaign.id);
    print_status("channels", &campaign.channels.join(", "));
    print_info("Run it with: herald campaign run <id>");
    Ok(())
}

async fn run_agents(args: &[String]) -> Result<()> {
    let Some(id) = args.get(3).filter(|a| !a.starts_with('-')).cloned() else {
        print_error("Usage: herald campaign run <id> [--agents a,b,c]");
        return Ok(());
    };

    let app = App::init(Config::from_env()?)?;
    let order = flag_list(args, 4, &["--agents"])
        .unwrap_or_else(|| DEFAULT_AGENT_ORDER.iter().map(|s| s.to_string()).collect());
    let order: Vec<&str> = order.iter().map(String::as_str).collect();

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    print_info(&format!("Running {} agents...", order.len()));
    let report = app.runner.run_campaign(&id, &order, cancel).await?;

    for outcome in &report.outcomes {
        match outcome.status {
            TaskStatus::Done => print_status(
                &outcome.agent,
                &format!("{} asset(s)", outcome.assets),
            ),
            _ => print_status(
                &outcome.agent,
                &format!("failed: {}", outcome.error.as_deref().unwrap_or("unknown")),
            ),
        }
    }

    if report.cancelled {
        print_warn("Run cancelled before all agents were dispatched.");
    }
    if report.failed_agents().is_empty() {
        print_success(&format!("Done. {} assets created.", report.assets_created));
    } else {
        print_warn(&format!(
            "Done with failures ({}). {} assets created.",
            report.failed_agents().join(", "),
            report.assets_created
        ));
    }
    Ok(())
}

async fn show(args: &[String]) -> Result<()> {
    let Some(id) = args.get(3).cloned() else {
        print_error("Usage: herald campaign show <id>");
        return Ok(());
    };

    let app = App::init(Config::from_env()?)?;
    let Some(campaign) = app.store.get_campaign(&id).await? else {
        print_error(&format!("Campaign {} not found.", id));
        return Ok(());
    };

    println!("\n {}", style(&campaign.title).bold());
    print_status("status", campaign.status.as_str());
    print_status("objective", &campaign.objective);
    print_status("channels", &campaign.channels.join(", "));

    let tasks = app.store.list_tasks_for_campaign(&id).await?;
    if !tasks.is_empty() {
        println!("\n {}", style("Tasks").bold().underlined());
        for task in tasks {
            println!(
                "   {:<12} {:<8} {}ms",
                style(&task.agent).green(),
                task.status.as_str(),
                task.latency_ms
            );
        }
    }

    let assets = app.store.list_assets_for_campaign(&id).await?;
    if !assets.is_empty() {
        println!("\n {}", style("Assets").bold().underlined());
        for asset in assets {
            println!(
                "   {:<14} v{:<3} {}  ({})",
                asset.kind.as_str(),
                asset.version,
                style(&asset.title).bold(),
                asset.id
            );
        }
    }
    println!();
    Ok(())
}

async fn list() -> Result<()> {
    let app = App::init(Config::from_env()?)?;
    let campaigns = app.store.list_campaigns().await?;
    if campaigns.is_empty() {
        print_info("No campaigns yet. Create one with: herald campaign create");
        return Ok(());
    }
    for campaign in campaigns {
        println!(
            "   {:<10} {}  ({})",
            campaign.status.as_str(),
            style(&campaign.title).bold(),
            campaign.id
        );
    }
    Ok(())
}
