// Key scheme for the single-table layout

use md5::{Digest, Md5};
use std::fmt;

/// Partition key prefix for item rows
pub const TODO_PREFIX: &str = "TODO#";

/// Partition key prefix for tag index rows
pub const TAG_PREFIX: &str = "TAG#";

/// Context used when none is given
pub const DEFAULT_CONTEXT: &str = "INBOX";

/// Default width of generated ids
pub const DEFAULT_ID_LEN: usize = 4;

/// Widest id the generator can produce (an MD5 digest in hex)
pub const MAX_ID_LEN: usize = 32;

/// Completion state, encoded as the leading segment of every sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Done,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Done => "DONE",
        }
    }

    /// Status for a done flag
    pub fn from_done(done: bool) -> Self {
        if done { Status::Done } else { Status::Pending }
    }

    pub fn is_done(self) -> bool {
        self == Status::Done
    }

    /// Parse the status segment of a sort key (`PENDING#ab12` -> Pending)
    pub fn from_sort_key(sk: &str) -> Option<Self> {
        match sk.split('#').next()? {
            "PENDING" => Some(Status::Pending),
            "DONE" => Some(Status::Done),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `TODO#<id>`
pub fn item_pk(id: &str) -> String {
    format!("{}{}", TODO_PREFIX, id)
}

/// `TAG#<tag>`
pub fn tag_pk(tag: &str) -> String {
    format!("{}{}", TAG_PREFIX, tag)
}

/// `<STATUS>#<id>`
pub fn sort_key(status: Status, id: &str) -> String {
    format!("{}#{}", status, id)
}

/// Strip `TODO#` from an item partition key
pub fn id_from_pk(pk: &str) -> &str {
    pk.strip_prefix(TODO_PREFIX).unwrap_or(pk)
}

/// Derive an id from the item text: hex MD5 truncated to `len` characters.
///
/// Short ids collide easily; nothing checks for it.
pub fn generate_id(text: &str, len: usize) -> String {
    let digest = Md5::digest(text.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(len.min(MAX_ID_LEN));
    id
}

/// Split a stored or user-supplied tag string on commas.
///
/// No trimming or dedup; an empty string yields one empty tag.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',').map(str::to_string).collect()
}

/// Upper-case a context label, falling back to `INBOX` when empty
pub fn normalize_context(context: Option<&str>) -> String {
    match context {
        Some(c) if !c.is_empty() => c.to_uppercase(),
        _ => DEFAULT_CONTEXT.to_string(),
    }
}
