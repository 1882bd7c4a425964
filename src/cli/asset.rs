use anyhow::Result;
use console::style;
use std::time::Duration;

use super::{flag_value, has_flag};
use crate::core::autosave::AutosaveSession;
use crate::core::bootstrap::App;
use crate::core::config::Config;
use crate::core::store::types::AssetPatch;
use crate::core::terminal::{print_error, print_status, print_success};

pub async fn run(args: &[String]) -> Result<()> {
    let sub = args.get(2).map(String::as_str).unwrap_or("");
    match sub {
        "show" => show(args).await,
        "history" => history(args).await,
        "save" => save(args).await,
        _ => {
            print_error("Usage: herald asset <show|history|save>");
            Ok(())
        }
    }
}

async fn show(args: &[String]) -> Result<()> {
    let Some(id) = args.get(3) else {
        print_error("Usage: herald asset show <id>");
        return Ok(());
    };

    let app = App::init(Config::from_env()?)?;
    let Some(asset) = app.store.get_asset(id).await? else {
        print_error(&format!("Asset {} not found.", id));
        return Ok(());
    };

    println!("\n {}", style(&asset.title).bold());
    print_status("kind", asset.kind.as_str());
    print_status("version", &asset.version.to_string());
    print_status("lineage", &asset.lineage_id);
    if let Some(words) = asset.metadata["word_count"].as_u64() {
        print_status("words", &words.to_string());
    }
    println!("\n{}\n", asset.body);
    Ok(())
}

async fn history(args: &[String]) -> Result<()> {
    let Some(id) = args.get(3) else {
        print_error("Usage: herald asset history <id>");
        return Ok(());
    };

    let app = App::init(Config::from_env()?)?;
    let Some(asset) = app.store.get_asset(id).await? else {
        print_error(&format!("Asset {} not found.", id));
        return Ok(());
    };

    for version in app.store.list_lineage(&asset.lineage_id).await? {
        println!(
            "   v{:<3} {}  {}  ({})",
            version.version,
            version.updated_at,
            style(&version.title).bold(),
            version.id
        );
    }
    Ok(())
}

async fn save(args: &[String]) -> Result<()> {
    let Some(id) = args.get(3).filter(|a| !a.starts_with('-')).cloned() else {
        print_error("Usage: herald asset save <id> [--title t] [--body b] [--new-version]");
        return Ok(());
    };

    let patch = AssetPatch {
        title: flag_value(args, 4, &["--title"]),
        body: flag_value(args, 4, &["--body"]),
        metadata: None,
    };
    if patch.title.is_none() && patch.body.is_none() {
        print_error("Error: nothing to save; pass --title and/or --body.");
        return Ok(());
    }

    let app = App::init(Config::from_env()?)?;
    let session = AutosaveSession::new(app.store.clone(), &id, Duration::from_secs(60));
    session.edit(patch).await;

    let saved = if has_flag(args, 4, &["--new-version"]) {
        session.save_as_new_version().await?
    } else {
        match session.flush().await? {
            Some(saved) => saved,
            None => return Ok(()),
        }
    };
    print_success(&format!("Saved {} at version {}", saved.id, saved.version));
    Ok(())
}
