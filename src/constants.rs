pub const PAGE_SIZE: u32 = 10;

/// [`PAGE_SIZE`] as a result count limit.
pub const PAGE_LIMIT: usize = PAGE_SIZE as usize;

pub const MAX_QUERY_CHARS: usize = 100;

pub mod cache {

    pub const DEFAULT_CAPACITY: usize = 100;

    pub const DEFAULT_TTL_SECONDS: u64 = 300;
}

pub mod http {

    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

    pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

    pub const API_USER_AGENT: &str = "gifbot/0.1";
}

pub mod cursor {

    /// Longest cursor text accepted by the decoder.
    pub const MAX_ENCODED_LEN: usize = 600;
}

pub mod bot {

    pub const DEFAULT_COOLDOWN_SECONDS: u64 = 2;
}
