// Plain-text output for listings

use crate::store::Listing;
use crate::todo::TodoItem;
use colored::Colorize;
use std::io::{self, Write};

pub const NO_RESULTS: &str = "No results found.";
pub const NO_ITEM: &str = "No item found.";
pub const TRUNCATED_WARNING: &str = "WARNING: Maximum item limit reached. Results will be truncated.";

/// Fixed-width ID / TASK / TAGS table followed by the record count
pub fn format_table(items: &[TodoItem]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>4}  {:<30}  {}\n", "ID", "TASK", "TAGS"));
    out.push_str(&format!("{:>4}  {:<30}  {}\n", "----", "----", "----"));

    for item in items {
        out.push_str(&format!("{:>4}  {:<30}  {}\n", item.id, item.text, item.tags_string()));
    }

    out.push_str(&format!("\nTotal records: {}\n", items.len()));
    out
}

/// Print the table to `out`
pub fn print_items<W: Write>(out: &mut W, items: &[TodoItem]) -> io::Result<()> {
    write!(out, "{}", format_table(items))
}

/// Output for a listing by context
///
/// A truncated page is only logged; the warning line belongs to tag listings.
pub fn write_context_listing<W: Write>(
    out: &mut W,
    listing: &Listing,
    context: &str,
    done: bool,
    key: Option<&str>,
) -> io::Result<()> {
    if listing.is_empty() {
        return writeln!(out, "{}", NO_RESULTS);
    }

    writeln!(out, "Showing tasks on context '{}', with isDone '{}'.", context, done)?;
    if let Some(key) = key.filter(|k| !k.is_empty()) {
        writeln!(out, "Further filtering using key '{}'.", key)?;
    }
    writeln!(out)?;

    print_items(out, &listing.items)
}

/// Output for a listing by tags
pub fn write_tag_listing<W: Write>(
    out: &mut W,
    listing: &Listing,
    tag_expr: &str,
    context: &str,
    done: bool,
) -> io::Result<()> {
    if listing.truncated {
        writeln!(out, "{}", TRUNCATED_WARNING.yellow())?;
    }

    if listing.is_empty() {
        return writeln!(out, "{}", NO_RESULTS);
    }

    writeln!(
        out,
        "Showing tasks with tags '{}' on context '{}', with isDone '{}'.",
        tag_expr, context, done
    )?;

    print_items(out, &listing.items)
}
