use anyhow::Context;

use super::print_page;
use crate::domain::{Offset, Query};
use crate::state::SharedState;

pub async fn cmd_search(state: &SharedState, query: &str, page: u32) -> anyhow::Result<()> {
    let query = Query::parse(query).context("Invalid search query")?;
    println!("Searching for: {query}");

    let page = state
        .paginator
        .load(query, Offset::for_page(page))
        .await
        .context("Search failed")?;

    print_page(&page);
    Ok(())
}
