use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::flag_value;
use crate::core::bootstrap::App;
use crate::core::config::Config;
use crate::core::terminal::{print_error, print_info, print_status, print_success};

pub async fn run(args: &[String]) -> Result<()> {
    let sub = args.get(2).map(String::as_str).unwrap_or("");
    match sub {
        "connect" => connect(args).await,
        "disconnect" => disconnect(args).await,
        "list" => list(args).await,
        _ => {
            print_error("Usage: herald channel <connect|disconnect|list>");
            Ok(())
        }
    }
}

fn user_id(args: &[String]) -> Option<String> {
    flag_value(args, 3, &["--user", "-u"])
}

async fn connect(args: &[String]) -> Result<()> {
    let Some(platform) = args.get(3).filter(|a| !a.starts_with('-')).cloned() else {
        print_error("Usage: herald channel connect <platform> --user <id> --token <token>");
        return Ok(());
    };
    let Some(user) = user_id(args) else {
        print_error("Error: --user is required.");
        return Ok(());
    };
    let Some(token) = flag_value(args, 4, &["--token"]) else {
        print_error("Error: --token is required.");
        return Ok(());
    };

    let expires_at = match flag_value(args, 4, &["--expires"]) {
        Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(_) => {
                print_error("Error: --expires must be an RFC 3339 timestamp.");
                return Ok(());
            }
        },
        None => None,
    };

    let app = App::init(Config::from_env()?)?;
    // The plaintext token never reaches the database.
    let encrypted = app.crypto.encrypt(&token)?;
    let metadata = match flag_value(args, 4, &["--account"]) {
        Some(account_id) => json!({"account_id": account_id}),
        None => Value::Null,
    };

    app.store
        .upsert_credential(&platform, &user, &encrypted, expires_at, metadata)
        .await?;
    print_success(&format!("Connected {} for {}", platform, user));
    Ok(())
}

async fn disconnect(args: &[String]) -> Result<()> {
    let Some(platform) = args.get(3).filter(|a| !a.starts_with('-')).cloned() else {
        print_error("Usage: herald channel disconnect <platform> --user <id>");
        return Ok(());
    };
    let Some(user) = user_id(args) else {
        print_error("Error: --user is required.");
        return Ok(());
    };

    let app = App::init(Config::from_env()?)?;
    if app.store.delete_credential(&platform, &user).await? {
        print_success(&format!("Disconnected {} for {}", platform, user));
    } else {
        print_info(&format!("{} was not connected for {}", platform, user));
    }
    Ok(())
}

async fn list(args: &[String]) -> Result<()> {
    let Some(user) = user_id(args) else {
        print_error("Usage: herald channel list --user <id>");
        return Ok(());
    };

    let app = App::init(Config::from_env()?)?;
    let connected = app.store.list_connected_platforms(&user).await?;
    for platform in app.publishers.platforms() {
        let state = if connected.contains(&platform) {
            "connected"
        } else {
            "not connected"
        };
        print_status(&platform, state);
    }
    Ok(())
}
