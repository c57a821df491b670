mod allow;
mod chat;
mod init;
mod page;
mod search;

pub use allow::{cmd_allow_add, cmd_allow_list, cmd_allow_remove};
pub use chat::cmd_chat;
pub use init::cmd_init;
pub use page::cmd_page;
pub use search::cmd_search;

use crate::models::Page;

/// Print a page with its navigation cursors.
fn print_page(page: &Page) {
    println!();
    println!(
        "Page {} for \"{}\"{}",
        page.page_number(),
        page.query(),
        if page.from_cache() { " (cached)" } else { "" }
    );
    println!("{:-<60}", "");

    if page.is_empty() {
        println!("Nothing found on this page.");
    }

    for (i, result) in page.results().iter().enumerate() {
        println!("{:>2}. {}", i + 1, result.url());
        if let Some(caption) = result.caption() {
            println!("    {caption}");
        }
    }

    println!();
    if let Some(previous) = page.previous_cursor() {
        println!("Previous: gifbot page {previous}");
    }
    println!("Next:     gifbot page {}", page.next_cursor());
}
