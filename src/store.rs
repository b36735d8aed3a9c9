// TODO façade over the single-table key-value layout

use crate::keys::{self, DEFAULT_ID_LEN, MAX_ID_LEN, Status};
use crate::kv::{KvStore, Query};
use crate::todo::TodoItem;
use eyre::{Context, Result, eyre};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Field values for an add or update, as given on the command line
///
/// Empty strings mean "not given": an empty `id` is generated on add, and an
/// empty `context` or `tags` is inherited from the stored item on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFields {
    pub id: String,
    pub context: String,
    pub text: String,
    pub tags: String,
    pub done: bool,
}

/// Result of a listing
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub items: Vec<TodoItem>,
    /// A query page limit was hit and the result may be incomplete
    pub truncated: bool,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// TODO list operations on top of any [`KvStore`]
///
/// Every write is a sequence of independent row operations. An update deletes
/// the old item and tag rows before writing the new ones, so a failure midway
/// leaves the item missing, and a concurrent reader can observe the gap.
pub struct TodoStore<K: KvStore> {
    kv: K,
    id_len: usize,
}

impl<K: KvStore> TodoStore<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            id_len: DEFAULT_ID_LEN,
        }
    }

    /// Width of generated ids (1..=32)
    pub fn with_id_len(mut self, id_len: usize) -> Result<Self> {
        if id_len == 0 || id_len > MAX_ID_LEN {
            return Err(eyre!("Id length must be between 1 and {}, got {}", MAX_ID_LEN, id_len));
        }
        self.id_len = id_len;
        Ok(self)
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut K {
        &mut self.kv
    }

    /// Write the item row and one tag row per tag.
    ///
    /// There is no existence check. Writing an id that is already stored under
    /// the other status leaves those old rows in place.
    pub fn add(&mut self, fields: &TodoFields) -> Result<TodoItem> {
        let id = if fields.id.is_empty() {
            keys::generate_id(&fields.text, self.id_len)
        } else {
            Self::validate_id(&fields.id)?;
            fields.id.clone()
        };

        let item = TodoItem {
            id,
            text: fields.text.clone(),
            context: fields.context.clone(),
            tags: keys::split_tags(&fields.tags),
            done: fields.done,
        };

        self.kv
            .put_item(&item.to_row(now_ms()))
            .with_context(|| format!("Failed to write item {}", item.id))?;

        for tag_row in item.tag_rows() {
            self.kv
                .put_item(&tag_row)
                .with_context(|| format!("Failed to write tag row {}", tag_row.pk))?;
        }

        info!(id = %item.id, context = %item.context, status = %item.status(), tags = item.tags.len(), "Added item");
        Ok(item)
    }

    /// Replace a pending item by deleting all of its rows and adding it again.
    ///
    /// Only `PENDING#<id>` is looked up; a done item is reported as not found.
    /// Returns `None` when no such item exists.
    pub fn update(&mut self, fields: &TodoFields) -> Result<Option<TodoItem>> {
        Self::validate_id(&fields.id)?;

        let pk = keys::item_pk(&fields.id);
        let sk = keys::sort_key(Status::Pending, &fields.id);

        let Some(row) = self.kv.get_item(&pk, &sk)? else {
            info!(id = %fields.id, "No pending item to update");
            return Ok(None);
        };
        let old = TodoItem::from_row(&row)?;

        for tag_row in old.tag_rows() {
            self.kv
                .delete_item(&tag_row.pk, &tag_row.sk)
                .with_context(|| format!("Failed to delete tag row {}", tag_row.pk))?;
        }
        self.kv
            .delete_item(&row.pk, &row.sk)
            .with_context(|| format!("Failed to delete item {}", old.id))?;

        debug!(id = %old.id, tags = old.tags.len(), "Deleted old rows");

        let replacement = TodoFields {
            id: old.id.clone(),
            context: if fields.context.is_empty() {
                old.context.clone()
            } else {
                fields.context.clone()
            },
            text: fields.text.clone(),
            tags: if fields.tags.is_empty() {
                old.tags_string()
            } else {
                fields.tags.clone()
            },
            done: fields.done,
        };

        self.add(&replacement).map(Some)
    }

    /// Items in `context` with the given status, optionally narrowed to ids
    /// starting with `filter_key`
    pub fn list_by_context(&self, filter_key: Option<&str>, context: &str, done: bool) -> Result<Listing> {
        let mut prefix = Status::from_done(done).to_string();
        if let Some(key) = filter_key.filter(|k| !k.is_empty()) {
            prefix.push('#');
            prefix.push_str(key);
        }

        let out = self.kv.query(&Query::context(context).begins_with(prefix))?;
        if out.truncated {
            warn!(context, "Context listing hit the page limit");
        }

        let items = out.items.iter().map(TodoItem::from_row).collect::<Result<Vec<_>>>()?;

        Ok(Listing {
            items,
            truncated: out.truncated,
        })
    }

    /// Items in `context` carrying any of the tags in `tag_expr`.
    ///
    /// `tag_expr` is comma separated. Tokens prefixed with `-` are exclusions;
    /// they are looked up but do not remove anything from the result.
    pub fn list_by_tags(&self, tag_expr: &str, context: &str, done: bool) -> Result<Listing> {
        let status = Status::from_done(done);
        let mut sort_keys: HashSet<String> = HashSet::new();
        let mut truncated = false;

        for token in keys::split_tags(tag_expr) {
            let (tag, exclude) = match token.strip_prefix('-') {
                Some(tag) => (tag, true),
                None => (token.as_str(), false),
            };

            // nothing to remove from an empty set
            if exclude && sort_keys.is_empty() {
                continue;
            }

            let out = self.kv.query(&Query::table(keys::tag_pk(tag)).begins_with(status.as_str()))?;
            let page_full = out.truncated;

            if exclude {
                // TODO: settle whether exclusions should subtract; users may rely on them being ignored
                debug!(tag, matched = out.items.len(), "Exclusion tag left the result unchanged");
            } else {
                debug!(tag, matched = out.items.len(), "Collected tag keys");
                sort_keys.extend(out.items.into_iter().map(|row| row.sk));
            }

            if page_full {
                warn!(tag, "Tag listing hit the page limit");
                truncated = true;
                break;
            }
        }

        if sort_keys.is_empty() {
            return Ok(Listing {
                items: Vec::new(),
                truncated,
            });
        }

        // SK is part of the index key, so the join happens here rather than in the query
        let out = self.kv.query(&Query::context(context))?;
        if out.truncated {
            warn!(context, "Context listing hit the page limit");
        }

        let items = out
            .items
            .iter()
            .filter(|row| sort_keys.contains(&row.sk))
            .map(TodoItem::from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(Listing {
            items,
            truncated: truncated || out.truncated,
        })
    }

    fn validate_id(id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(eyre!("Item ID cannot be empty or whitespace-only"));
        }
        if id.len() > 256 {
            return Err(eyre!("Item ID too long: {} chars (max 256)", id.len()));
        }
        Ok(())
    }
}

/// Milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
