use crate::config::Config;
use crate::services::AllowList;

async fn open(config: &Config) -> anyhow::Result<AllowList> {
    Ok(AllowList::load(&config.access.allowlist_path, config.access.admin_id.clone()).await?)
}

pub async fn cmd_allow_add(config: &Config, id: &str) -> anyhow::Result<()> {
    let list = open(config).await?;
    if list.add(id).await? {
        println!("✓ Added {} to {}", id.trim(), list.path().display());
    } else {
        println!("{} is already allowed", id.trim());
    }
    Ok(())
}

pub async fn cmd_allow_remove(config: &Config, id: &str) -> anyhow::Result<()> {
    let list = open(config).await?;
    if list.remove(id).await? {
        println!("✓ Removed {} from {}", id.trim(), list.path().display());
    } else {
        println!("{} was not on the allow-list", id.trim());
    }
    Ok(())
}

pub async fn cmd_allow_list(config: &Config) -> anyhow::Result<()> {
    let list = open(config).await?;
    let entries = list.list();

    if let Some(admin) = &config.access.admin_id {
        println!("Admin: {admin}");
    }

    if entries.is_empty() {
        println!("The allow-list is empty.");
        return Ok(());
    }

    println!("Allowed users ({}):", entries.len());
    for entry in entries {
        println!("• {entry}");
    }
    Ok(())
}
