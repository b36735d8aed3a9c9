// Command-line surface and dispatch

use crate::keys::{self, DEFAULT_CONTEXT, DEFAULT_ID_LEN};
use crate::report;
use crate::sqlite::{DEFAULT_PAGE_LIMIT, SqliteTable};
use crate::store::{TodoFields, TodoStore};
use clap::{ArgAction, Parser};
use eyre::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "todostore")]
#[command(about = "TODO list manager on a single-table key-value layout")]
#[command(version)]
pub struct Cli {
    /// Directory holding the database (default: platform data directory)
    #[arg(long, env = "TODOSTORE_PATH")]
    pub store_path: Option<PathBuf>,

    /// Table name inside the database
    #[arg(long, env = "TODOSTORE_TABLE", default_value = "todos")]
    pub table: String,

    /// Width of ids generated from the item text
    #[arg(long, env = "TODOSTORE_ID_LEN", default_value_t = DEFAULT_ID_LEN)]
    pub id_len: usize,

    /// Maximum rows returned by a single query
    #[arg(long, env = "TODOSTORE_PAGE_LIMIT", default_value_t = DEFAULT_PAGE_LIMIT)]
    pub page_limit: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Sets the text of the TODO
    #[arg(long)]
    pub text: Option<String>,

    /// Sets the key of the TODO. Generated from the text if not given
    #[arg(long)]
    pub key: Option<String>,

    /// Adds a new TODO with the given text (shortcut for --text without --key)
    #[arg(long)]
    pub add: Option<String>,

    /// Context to use (upper-cased, default INBOX)
    #[arg(long)]
    pub context: Option<String>,

    /// Comma-separated tags to attach, or to filter by (prefix with - to exclude)
    #[arg(long)]
    pub tags: Option<String>,

    /// Marks the TODO as done, or lists done TODOs
    #[arg(long)]
    pub done: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Where and how the store is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store_path: PathBuf,
    pub table: String,
    pub id_len: usize,
    pub page_limit: usize,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            store_path: cli.store_path.clone().unwrap_or_else(default_store_path),
            table: cli.table.clone(),
            id_len: cli.id_len,
            page_limit: cli.page_limit,
        }
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("todostore"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The one operation a run performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(TodoFields),
    Update(TodoFields),
    ListByTags {
        tags: String,
        context: String,
        done: bool,
    },
    ListByContext {
        key: Option<String>,
        context: String,
        done: bool,
    },
}

impl Command {
    /// Pick the operation from the flags; first match wins:
    /// add, update, list by tags, list by context.
    pub fn resolve(cli: &Cli) -> Self {
        let add = cli.add.clone().unwrap_or_default();
        let mut key = cli.key.clone().unwrap_or_default();
        let mut text = cli.text.clone().unwrap_or_default();
        let tags = cli.tags.clone().unwrap_or_default();

        if !add.is_empty() {
            key.clear();
            text = add.clone();
        }

        if (key.is_empty() && !text.is_empty()) || !add.is_empty() {
            return Command::Add(TodoFields {
                id: key,
                context: keys::normalize_context(cli.context.as_deref()),
                text,
                tags,
                done: cli.done,
            });
        }

        if !key.is_empty() && !text.is_empty() {
            // an explicit empty context keeps the stored one; no flag means INBOX
            let context = match cli.context.as_deref() {
                Some(context) => context.to_uppercase(),
                None => DEFAULT_CONTEXT.to_string(),
            };
            return Command::Update(TodoFields {
                id: key,
                context,
                text,
                tags,
                done: cli.done,
            });
        }

        let context = keys::normalize_context(cli.context.as_deref());

        if !tags.is_empty() {
            return Command::ListByTags {
                tags,
                context,
                done: cli.done,
            };
        }

        Command::ListByContext {
            key: Some(key).filter(|k| !k.is_empty()),
            context,
            done: cli.done,
        }
    }
}

/// Open the store, run the command, write the report to `out`
pub fn run<W: Write>(config: &Config, command: &Command, out: &mut W) -> Result<()> {
    let table = SqliteTable::open(&config.store_path, &config.table)
        .with_context(|| format!("Failed to open store at {}", config.store_path.display()))?
        .with_page_limit(config.page_limit)?;
    let mut store = TodoStore::new(table).with_id_len(config.id_len)?;

    match command {
        Command::Add(fields) => {
            let item = store.add(fields)?;
            writeln!(out, "Added item '{}'.", item.id)?;
        }
        Command::Update(fields) => match store.update(fields)? {
            Some(item) => writeln!(out, "Updated item '{}'.", item.id)?,
            None => writeln!(out, "{}", report::NO_ITEM)?,
        },
        Command::ListByTags { tags, context, done } => {
            let listing = store.list_by_tags(tags, context, *done)?;
            report::write_tag_listing(out, &listing, tags, context, *done)?;
        }
        Command::ListByContext { key, context, done } => {
            let listing = store.list_by_context(key.as_deref(), context, *done)?;
            report::write_context_listing(out, &listing, context, *done, key.as_deref())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["todostore"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn config(temp: &TempDir) -> Config {
        Config {
            store_path: temp.path().to_path_buf(),
            table: "todos".to_string(),
            id_len: DEFAULT_ID_LEN,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    fn exec(temp: &TempDir, args: &[&str]) -> String {
        let command = Command::resolve(&parse(args));
        let mut buf = Vec::new();
        run(&config(temp), &command, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_resolve_add_from_text() {
        let command = Command::resolve(&parse(&["--text", "buy milk", "--context", "home", "--tags", "a,b"]));
        assert_eq!(
            command,
            Command::Add(TodoFields {
                id: String::new(),
                context: "HOME".to_string(),
                text: "buy milk".to_string(),
                tags: "a,b".to_string(),
                done: false,
            })
        );
    }

    #[test]
    fn test_resolve_add_shortcut_clears_key() {
        let command = Command::resolve(&parse(&["--add", "buy milk", "--key", "k1", "--text", "ignored"]));
        match command {
            Command::Add(fields) => {
                assert_eq!(fields.id, "");
                assert_eq!(fields.text, "buy milk");
                assert_eq!(fields.context, "INBOX");
            }
            other => panic!("expected add, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_update() {
        let command = Command::resolve(&parse(&["--key", "k1", "--text", "new", "--done"]));
        assert_eq!(
            command,
            Command::Update(TodoFields {
                id: "k1".to_string(),
                context: "INBOX".to_string(),
                text: "new".to_string(),
                tags: String::new(),
                done: true,
            })
        );
    }

    #[test]
    fn test_resolve_update_context() {
        let context_of = |args: &[&str]| match Command::resolve(&parse(args)) {
            Command::Update(fields) => fields.context,
            other => panic!("expected update, got {:?}", other),
        };

        assert_eq!(context_of(&["--key", "k1", "--text", "new"]), "INBOX");
        assert_eq!(context_of(&["--key", "k1", "--text", "new", "--context", ""]), "");
        assert_eq!(context_of(&["--key", "k1", "--text", "new", "--context", "work"]), "WORK");
    }

    #[test]
    fn test_run_update_context_flag() {
        let temp = TempDir::new().unwrap();
        let id = crate::keys::generate_id("task", DEFAULT_ID_LEN);
        exec(&temp, &["--text", "task", "--context", "work", "--tags", "a"]);

        // Explicitly empty: stays in WORK
        exec(&temp, &["--key", &id, "--text", "kept", "--context", ""]);
        assert!(exec(&temp, &["--context", "work"]).contains("kept"));

        // Omitted: moves to INBOX
        exec(&temp, &["--key", &id, "--text", "moved"]);
        assert_eq!(exec(&temp, &["--context", "work"]), "No results found.\n");
        let inbox = exec(&temp, &[]);
        assert!(inbox.contains(&format!("{}  {:<30}  a", id, "moved")));
    }

    #[test]
    fn test_resolve_listings() {
        let command = Command::resolve(&parse(&["--tags", "x,-y", "--context", "work"]));
        assert_eq!(
            command,
            Command::ListByTags {
                tags: "x,-y".to_string(),
                context: "WORK".to_string(),
                done: false,
            }
        );

        let command = Command::resolve(&parse(&["--key", "k1", "--done"]));
        assert_eq!(
            command,
            Command::ListByContext {
                key: Some("k1".to_string()),
                context: "INBOX".to_string(),
                done: true,
            }
        );

        let command = Command::resolve(&parse(&[]));
        assert_eq!(
            command,
            Command::ListByContext {
                key: None,
                context: "INBOX".to_string(),
                done: false,
            }
        );
    }

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(parse(&[]).log_level(), Level::WARN);
        assert_eq!(parse(&["-v"]).log_level(), Level::INFO);
        assert_eq!(parse(&["-vv"]).log_level(), Level::DEBUG);
        assert_eq!(parse(&["-vvvv"]).log_level(), Level::TRACE);
    }

    #[test]
    fn test_config_from_cli() {
        let cli = parse(&["--store-path", "/tmp/todos", "--table", "items", "--id-len", "6"]);
        let config = Config::from_cli(&cli);
        assert_eq!(config.store_path, PathBuf::from("/tmp/todos"));
        assert_eq!(config.table, "items");
        assert_eq!(config.id_len, 6);
        assert_eq!(config.page_limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_run_empty_store_prints_no_results() {
        let temp = TempDir::new().unwrap();
        assert_eq!(exec(&temp, &[]), "No results found.\n");
        assert_eq!(exec(&temp, &["--tags", "x"]), "No results found.\n");
    }

    #[test]
    fn test_run_add_then_list() {
        let temp = TempDir::new().unwrap();

        assert_eq!(exec(&temp, &["--add", "hello", "--tags", "t1,t2"]), "Added item '5d41'.\n");

        let out = exec(&temp, &[]);
        assert!(out.starts_with("Showing tasks on context 'INBOX', with isDone 'false'.\n\n"));
        assert!(out.contains(&format!("5d41  {:<30}  t1,t2", "hello")));
        assert!(out.ends_with("Total records: 1\n"));
    }

    #[test]
    fn test_run_update_flow() {
        let temp = TempDir::new().unwrap();

        assert_eq!(exec(&temp, &["--key", "zz", "--text", "x"]), "No item found.\n");

        exec(&temp, &["--text", "task", "--context", "work", "--tags", "a"]);
        let id = crate::keys::generate_id("task", DEFAULT_ID_LEN);

        let out = exec(&temp, &["--key", &id, "--text", "task done", "--context", "", "--done"]);
        assert_eq!(out, format!("Updated item '{}'.\n", id));

        let done = exec(&temp, &["--context", "work", "--done"]);
        assert!(done.contains("task done"));
        assert_eq!(exec(&temp, &["--context", "work"]), "No results found.\n");

        let by_tag = exec(&temp, &["--tags", "a", "--context", "work", "--done"]);
        assert!(by_tag.starts_with("Showing tasks with tags 'a' on context 'WORK', with isDone 'true'.\n"));
    }

    #[test]
    fn test_run_rejects_zero_page_limit() {
        let temp = TempDir::new().unwrap();
        let mut cfg = config(&temp);
        cfg.page_limit = 0;

        let mut buf = Vec::new();
        assert!(run(&cfg, &Command::resolve(&parse(&[])), &mut buf).is_err());
    }

    #[test]
    fn test_run_rejects_bad_id_len() {
        let temp = TempDir::new().unwrap();
        let mut cfg = config(&temp);
        cfg.id_len = 0;

        let mut buf = Vec::new();
        assert!(run(&cfg, &Command::resolve(&parse(&[])), &mut buf).is_err());
    }
}
