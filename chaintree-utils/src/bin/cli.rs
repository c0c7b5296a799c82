use std::{path::PathBuf, str::FromStr};
use structopt::StructOpt;
use tracing::Level;

use chaintree::{
    error::{InsertError, Result as CoreResult},
    CancelToken, Config, MemStore, NodeId, QueryEngine, TableHandle, TreeNode, TreeStore,
};
use chaintree_utils::{dump, sqlite::SqliteStore};

#[cfg(target_env = "musl")]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

pub type Result<T> = anyhow::Result<T>;

#[derive(Clone)]
enum Storage {
    Memory(MemStore),
    Sqlite(SqliteStore),
}

impl TreeStore for Storage {
    fn table_names(&self) -> CoreResult<Vec<String>> {
        match self {
            Self::Memory(m) => m.table_names(),
            Self::Sqlite(s) => s.table_names(),
        }
    }

    fn create_table(&self, name: &str) -> CoreResult<TableHandle> {
        match self {
            Self::Memory(m) => m.create_table(name),
            Self::Sqlite(s) => s.create_table(name),
        }
    }

    fn insert(&self, table: &TableHandle, node: &TreeNode) -> std::result::Result<(), InsertError> {
        match self {
            Self::Memory(m) => m.insert(table, node),
            Self::Sqlite(s) => s.insert(table, node),
        }
    }

    fn get_by_id(&self, table: &TableHandle, id: NodeId) -> CoreResult<Option<TreeNode>> {
        match self {
            Self::Memory(m) => m.get_by_id(table, id),
            Self::Sqlite(s) => s.get_by_id(table, id),
        }
    }

    fn get_children(&self, table: &TableHandle, parent: NodeId) -> CoreResult<Vec<TreeNode>> {
        match self {
            Self::Memory(m) => m.get_children(table, parent),
            Self::Sqlite(s) => s.get_children(table, parent),
        }
    }

    fn get_by_identifier(&self, table: &TableHandle, code: i32) -> CoreResult<Vec<TreeNode>> {
        match self {
            Self::Memory(m) => m.get_by_identifier(table, code),
            Self::Sqlite(s) => s.get_by_identifier(table, code),
        }
    }

    fn scan(&self, table: &TableHandle, offset: usize, limit: usize) -> CoreResult<Vec<TreeNode>> {
        match self {
            Self::Memory(m) => m.scan(table, offset, limit),
            Self::Sqlite(s) => s.scan(table, offset, limit),
        }
    }
}

impl FromStr for Storage {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        let s = match s {
            "memory" => Self::Memory(MemStore::default()),
            x => Self::Sqlite(SqliteStore::open(x)?),
        };
        Ok(s)
    }
}

#[derive(StructOpt)]
#[structopt(about = "CLI to load and query decay chain trees")]
struct Opts {
    #[structopt(short, parse(from_occurrences = set_log_level), global = true)]
    #[allow(dead_code)] // log level will be set in [`set_log_level`]
    /// Increase verbosity
    verbosity: u64,
    #[structopt(long, default_value = "memory", global = true)]
    /// Storage, possible options "memory" (gone when the command exits),
    /// or a path to a sqlite database (will create it if it doesn't exist)
    storage: Storage,
    #[structopt(long, global = true)]
    /// Resolve the root path of every node after a load and report the broken ones
    validate: bool,
    #[structopt(subcommand)]
    cmd: Command,
}

fn set_log_level(verbosity: u64) -> u64 {
    let level = match verbosity {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();
    verbosity
}

#[derive(StructOpt)]
enum Command {
    /// Load a binary tree file into a table, creating the table if needed
    Load {
        #[structopt(long)]
        /// The tree file to read
        file: PathBuf,
        #[structopt(long)]
        /// The table to load into
        table: String,
    },
    /// Print every chain from a root to a node with the given kza, heaviest first
    Chains {
        #[structopt(long)]
        /// The table to query
        table: String,
        #[structopt(long)]
        /// The identifier code to look for
        kza: i32,
    },
    /// Print the minimal tree containing every chain to the given kza
    MinTree {
        #[structopt(long)]
        /// The table to query
        table: String,
        #[structopt(long)]
        /// The identifier code to look for
        kza: i32,
    },
    /// Print the rows of a table
    Dump {
        #[structopt(long)]
        /// The table to dump
        table: String,
        #[structopt(long)]
        /// Rows per page
        page_size: Option<usize>,
    },
    /// Print a whole table as a tree, starting from its roots
    Tree {
        #[structopt(long)]
        /// The table to print
        table: String,
    },
    /// List the tables in the storage
    Tables,
    /// Print the minimal tree for a kza as dot. Can be piped directly:
    /// `chaintree-cli graph --table <..> --kza <..> | dot -Tpng -o chains.png`.
    /// Nodes with the given kza are filled.
    Graph {
        #[structopt(long)]
        /// The table to query
        table: String,
        #[structopt(long)]
        /// The identifier code to look for
        kza: i32,
    },
}

fn main() -> Result<()> {
    let opts = Opts::from_args();
    let config = Config {
        validate_on_load: opts.validate,
        ..Config::default()
    };
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal, stopping...");
        on_interrupt.cancel();
    })?;
    let engine = QueryEngine::new(opts.storage, config)?.with_cancel(cancel);
    match opts.cmd {
        Command::Load { file, table } => {
            let table = engine.select_or_create(&table)?;
            let report = engine.load_file(&file, &table)?;
            println!(
                "loaded {} rows into {}, {} failed",
                report.inserted, table, report.failed
            );
            for failure in &report.invalid {
                println!("{}", failure);
            }
        }
        Command::Chains { table, kza } => {
            let table = engine.require(&table)?;
            for line in engine.query_chains(&table, kza)? {
                println!("{}", line);
            }
        }
        Command::MinTree { table, kza } => {
            let table = engine.require(&table)?;
            for line in engine.query_minimal_tree(&table, kza)? {
                println!("{}", line);
            }
        }
        Command::Dump { table, page_size } => {
            let table = engine.require(&table)?;
            let page_size = page_size.unwrap_or(engine.config().page_size);
            let stdout = std::io::stdout();
            dump::table(
                table.name(),
                engine.dump_table(&table, page_size),
                stdout.lock(),
            )?;
        }
        Command::Tree { table } => {
            let table = engine.require(&table)?;
            for line in engine.view_as_tree(&table)? {
                println!("{}", line);
            }
        }
        Command::Tables => {
            println!("Tables in Database");
            for name in engine.table_names()? {
                println!("{}", name);
            }
        }
        Command::Graph { table, kza } => {
            let table = engine.require(&table)?;
            let minimal = engine.minimal_tree_by_identifier(&table, kza)?;
            for failure in &minimal.failures {
                eprintln!("{}", failure);
            }
            let stdout = std::io::stdout();
            dump::graph(&minimal.tree, Some(kza), stdout.lock())?;
        }
    }

    Ok(())
}
