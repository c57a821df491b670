use anyhow::Context;

use super::print_page;
use crate::state::SharedState;

pub async fn cmd_page(state: &SharedState, cursor: &str) -> anyhow::Result<()> {
    let page = state
        .paginator
        .resolve(cursor)
        .await
        .context("Could not load page")?;

    print_page(&page);
    Ok(())
}
