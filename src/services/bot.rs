//! Transport-agnostic message handling.
//!
//! A transport turns whatever it receives into an [`Inbound`], hands it to
//! [`Dispatcher::handle`], and renders the [`Reply`] it gets back.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::InvalidQuery;
use crate::models::Page;
use crate::services::access::{AccessError, AccessGate};
use crate::services::paginator::{PageError, Paginator};
use crate::services::throttle::Cooldown;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text message: a command or a search query.
    Message { user: String, text: String },

    /// A navigation button press carrying a cursor.
    Callback { user: String, data: String },
}

impl Inbound {
    pub fn message(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Message {
            user: user.into(),
            text: text.into(),
        }
    }

    pub fn callback(user: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Callback {
            user: user.into(),
            data: data.into(),
        }
    }

    #[must_use]
    pub fn user(&self) -> &str {
        match self {
            Self::Message { user, .. } | Self::Callback { user, .. } => user,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    Help,
    AccessDenied,
    AdminOnly,
    Usage(&'static str),
    Added(String),
    AlreadyPresent(String),
    Removed(String),
    NotPresent(String),
    AllowList(Vec<String>),
    SlowDown(Duration),
    InvalidQuery(InvalidQuery),
    InvalidCursor,
    RetrievalFailed,
    StorageFailed,
    NoResults(Page),
    Page(Page),
}

impl Reply {
    /// The page carried by a search reply, for navigation controls.
    #[must_use]
    pub const fn page(&self) -> Option<&Page> {
        match self {
            Self::Page(page) | Self::NoResults(page) => Some(page),
            _ => None,
        }
    }

    /// Caption attached to the first item of a page.
    #[must_use]
    pub fn caption(page: &Page) -> String {
        format!("Page {}", page.page_number())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => write!(
                f,
                "Welcome to the GIF finder!\n\n\
                 Send me a search query and I'll find 10 GIFs for you.\n\n\
                 Examples:\n\
                 \u{2022} funny cats\n\
                 \u{2022} dancing robot\n\
                 \u{2022} happy birthday\n\n\
                 Queries are limited to {} characters.",
                crate::constants::MAX_QUERY_CHARS
            ),
            Self::AccessDenied => write!(f, "Access is restricted. Please contact the administrator."),
            Self::AdminOnly => write!(f, "Administrator rights required."),
            Self::Usage(usage) => write!(f, "Usage: {usage}"),
            Self::Added(id) => write!(f, "User {id} added to the allow-list"),
            Self::AlreadyPresent(id) => write!(f, "User {id} is already on the allow-list"),
            Self::Removed(id) => write!(f, "User {id} removed from the allow-list"),
            Self::NotPresent(id) => write!(f, "User {id} is not on the allow-list"),
            Self::AllowList(ids) if ids.is_empty() => write!(f, "The allow-list is empty"),
            Self::AllowList(ids) => write!(f, "Users on the allow-list:\n{}", ids.join("\n")),
            Self::SlowDown(wait) => write!(
                f,
                "Please wait {:.1}s between requests",
                wait.as_secs_f32()
            ),
            Self::InvalidQuery(InvalidQuery::Empty) => write!(f, "Please send a search query"),
            Self::InvalidQuery(InvalidQuery::TooLong { max, .. }) => {
                write!(f, "Query is too long (max. {max} characters)")
            }
            Self::InvalidCursor => write!(f, "This page link is no longer valid"),
            Self::RetrievalFailed => write!(f, "Something went wrong while searching, try again later"),
            Self::StorageFailed => write!(f, "Could not update the allow-list"),
            Self::NoResults(page) => write!(
                f,
                "Nothing found for \"{}\" ({})",
                page.query(),
                Self::caption(page)
            ),
            Self::Page(page) => {
                write!(f, "Results for: {}", page.query())?;
                for (i, result) in page.results().iter().enumerate() {
                    write!(f, "\n{:>2}. {}", i + 1, result.url())?;
                    if i == 0 {
                        write!(f, "  [{}]", Self::caption(page))?;
                    } else if let Some(caption) = result.caption() {
                        write!(f, "  ({caption})")?;
                    }
                }
                Ok(())
            }
        }
    }
}

pub struct Dispatcher {
    access: Arc<dyn AccessGate>,

    paginator: Arc<Paginator>,

    cooldown: Cooldown,
}

impl Dispatcher {
    #[must_use]
    pub fn new(access: Arc<dyn AccessGate>, paginator: Arc<Paginator>, cooldown: Cooldown) -> Self {
        Self {
            access,
            paginator,
            cooldown,
        }
    }

    #[must_use]
    pub const fn paginator(&self) -> &Arc<Paginator> {
        &self.paginator
    }

    pub async fn handle(&self, inbound: Inbound) -> Reply {
        match inbound {
            Inbound::Message { user, text } => self.handle_message(&user, &text).await,
            Inbound::Callback { user, data } => self.handle_callback(&user, &data).await,
        }
    }

    async fn handle_message(&self, user: &str, text: &str) -> Reply {
        let trimmed = text.trim();

        if let Some(command) = trimmed.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            let name = parts
                .next()
                .map(|n| n.split('@').next().unwrap_or(n))
                .unwrap_or_default();
            let argument = parts.next();

            match name {
                "start" | "help" => {
                    return if self.access.is_allowed(user) {
                        Reply::Help
                    } else {
                        Reply::AccessDenied
                    };
                }
                "add" => return self.admin_add(user, argument).await,
                "remove" => return self.admin_remove(user, argument).await,
                "whitelist" => {
                    return if self.access.is_admin(user) {
                        Reply::AllowList(self.access.list())
                    } else {
                        Reply::AdminOnly
                    };
                }
                _ => {}
            }
        }

        if let Some(denied) = self.admit(user) {
            return denied;
        }

        info!(user = %user, "New search");
        search_reply(self.paginator.open(trimmed).await)
    }

    async fn handle_callback(&self, user: &str, data: &str) -> Reply {
        if let Some(denied) = self.admit(user) {
            return denied;
        }
        search_reply(self.paginator.resolve(data).await)
    }

    /// Access check followed by cooldown; `None` means go ahead.
    fn admit(&self, user: &str) -> Option<Reply> {
        if !self.access.is_allowed(user) {
            return Some(Reply::AccessDenied);
        }
        self.cooldown.check(user).err().map(Reply::SlowDown)
    }

    async fn admin_add(&self, user: &str, argument: Option<&str>) -> Reply {
        if !self.access.is_admin(user) {
            return Reply::AdminOnly;
        }
        let Some(id) = argument else {
            return Reply::Usage("/add <user_id>");
        };
        match self.access.add(id).await {
            Ok(true) => Reply::Added(id.to_string()),
            Ok(false) => Reply::AlreadyPresent(id.to_string()),
            Err(e) => access_failure(&e, "/add <user_id>"),
        }
    }

    async fn admin_remove(&self, user: &str, argument: Option<&str>) -> Reply {
        if !self.access.is_admin(user) {
            return Reply::AdminOnly;
        }
        let Some(id) = argument else {
            return Reply::Usage("/remove <user_id>");
        };
        match self.access.remove(id).await {
            Ok(true) => Reply::Removed(id.to_string()),
            Ok(false) => Reply::NotPresent(id.to_string()),
            Err(e) => access_failure(&e, "/remove <user_id>"),
        }
    }
}

fn access_failure(error: &AccessError, usage: &'static str) -> Reply {
    match error {
        AccessError::InvalidIdentity(_) => Reply::Usage(usage),
        AccessError::Io(e) => {
            warn!("Allow-list update failed: {}", e);
            Reply::StorageFailed
        }
    }
}

fn search_reply(result: Result<Page, PageError>) -> Reply {
    match result {
        Ok(page) if page.is_empty() => Reply::NoResults(page),
        Ok(page) => Reply::Page(page),
        Err(PageError::InvalidQuery(e)) => Reply::InvalidQuery(e),
        Err(PageError::InvalidCursor(e)) => {
            warn!("Rejected cursor: {}", e);
            Reply::InvalidCursor
        }
        Err(PageError::RetrievalFailed(e)) => {
            warn!("Search failed: {}", e);
            Reply::RetrievalFailed
        }
    }
}
