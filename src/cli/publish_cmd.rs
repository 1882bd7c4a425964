use anyhow::Result;

use super::flag_value;
use crate::core::bootstrap::App;
use crate::core::config::Config;
use crate::core::publish::publish_asset;
use crate::core::terminal::{print_error, print_link, print_success, print_warn};

pub async fn run(args: &[String]) -> Result<()> {
    let (Some(asset_id), Some(platform)) = (args.get(2), args.get(3)) else {
        print_error("Usage: herald publish <asset-id> <platform> --user <id>");
        return Ok(());
    };
    let Some(user) = flag_value(args, 4, &["--user", "-u"]) else {
        print_error("Error: --user is required.");
        return Ok(());
    };

    let app = App::init(Config::from_env()?)?;
    let result = publish_asset(&app.store, &app.publishers, asset_id, platform, &user, None).await?;

    if result.success {
        print_success(&format!("Published to {}", platform));
        if let Some(url) = &result.url {
            print_link("url", url);
        }
    } else {
        print_warn(&format!(
            "Publish to {} failed: {}",
            platform,
            result.error.as_deref().unwrap_or("unknown error")
        ));
    }
    Ok(())
}
