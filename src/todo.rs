// TODO item and its row encoding

use crate::keys::{self, Status};
use crate::kv::{CONTEXT_ATTR, Row};
use eyre::{Result, eyre};

pub const NAME_ATTR: &str = "name";
pub const TAGS_ATTR: &str = "tags";
pub const UPDATED_AT_ATTR: &str = "updated_at";

/// A TODO entry as the user sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    pub context: String,
    pub tags: Vec<String>,
    pub done: bool,
}

impl TodoItem {
    pub fn status(&self) -> Status {
        Status::from_done(self.done)
    }

    /// `<STATUS>#<id>`, shared by the item row and all of its tag rows
    pub fn sort_key(&self) -> String {
        keys::sort_key(self.status(), &self.id)
    }

    /// Tags joined back into their stored form
    pub fn tags_string(&self) -> String {
        self.tags.join(",")
    }

    /// The item row: `TODO#<id>` / `<STATUS>#<id>`
    pub fn to_row(&self, updated_at: i64) -> Row {
        Row::new(keys::item_pk(&self.id), self.sort_key())
            .with(NAME_ATTR, self.text.as_str())
            .with(CONTEXT_ATTR, self.context.as_str())
            .with(TAGS_ATTR, self.tags_string())
            .with(UPDATED_AT_ATTR, updated_at)
    }

    /// One key-only row per tag: `TAG#<tag>` / `<STATUS>#<id>`
    pub fn tag_rows(&self) -> Vec<Row> {
        let sk = self.sort_key();
        self.tags.iter().map(|tag| Row::new(keys::tag_pk(tag), sk.clone())).collect()
    }

    /// Decode an item row
    pub fn from_row(row: &Row) -> Result<Self> {
        let id = row
            .pk
            .strip_prefix(keys::TODO_PREFIX)
            .ok_or_else(|| eyre!("Not an item row: {}", row.pk))?;

        let status =
            Status::from_sort_key(&row.sk).ok_or_else(|| eyre!("Unknown status in sort key: {}", row.sk))?;

        let text = row
            .attr_str(NAME_ATTR)
            .ok_or_else(|| eyre!("Item {} has no {} attribute", id, NAME_ATTR))?;

        Ok(Self {
            id: id.to_string(),
            text: text.to_string(),
            context: row.attr_str(CONTEXT_ATTR).unwrap_or_default().to_string(),
            tags: keys::split_tags(row.attr_str(TAGS_ATTR).unwrap_or_default()),
            done: status.is_done(),
        })
    }
}
