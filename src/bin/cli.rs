//! OrdoDB CLI
//!
//! Command-line interface for inspecting and editing an OrdoDB data
//! directory.

use clap::{Parser, Subcommand};
use ordodb::{
    Config, DataCursor, DataDb, DataRead, IndexSet, LogStore, OrderedStore, ReadOptions,
    StoreCursor, Value, WriteOptions,
};
use tracing_subscriber::{fmt, EnvFilter};

/// OrdoDB CLI
#[derive(Parser, Debug)]
#[command(name = "ordodb-cli")]
#[command(about = "CLI for the OrdoDB document store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./ordodb_data")]
    data_dir: String,

    /// fsync the WAL on every write
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a record, replacing its body and indexes
    Put {
        /// Record type
        type_name: String,

        /// Primary key segments
        #[arg(required = true)]
        primary_key: Vec<String>,

        /// Record body
        #[arg(short, long)]
        body: String,

        /// Index as name=value[,value...]; may be repeated
        #[arg(short, long = "index", value_parser = parse_index)]
        indexes: Vec<(String, Vec<String>)>,
    },

    /// Print the body of a record
    Get {
        type_name: String,
        #[arg(required = true)]
        primary_key: Vec<String>,
    },

    /// Delete a record and its indexes
    Delete {
        type_name: String,
        #[arg(required = true)]
        primary_key: Vec<String>,
    },

    /// List records, optionally by type or index
    Scan {
        /// Only records of this type
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Scan this index instead of the records
        #[arg(short, long, requires = "type_name")]
        index: Option<String>,

        /// Only index entries with this value (segments)
        #[arg(short, long, requires = "index", num_args = 1..)]
        value: Vec<String>,
    },

    /// List the indexes attached to a record
    Indexes {
        type_name: String,
        #[arg(required = true)]
        primary_key: Vec<String>,
    },

    /// Print every raw key and value in the store
    Dump,
}

fn parse_index(s: &str) -> Result<(String, Vec<String>), String> {
    let (name, values) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value[,value...], got '{}'", s))?;
    let values: Vec<String> = values.split(',').map(str::to_string).collect();
    if name.is_empty() || values.iter().any(String::is_empty) {
        return Err(format!("empty index name or value in '{}'", s));
    }
    Ok((name.to_string(), values))
}

/// Printable form of raw key bytes
fn escape(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|b| std::ascii::escape_default(*b))
        .map(char::from)
        .collect()
}

fn run(db: &DataDb, command: Commands, write_options: &WriteOptions) -> ordodb::Result<()> {
    let read_options = ReadOptions::DEFAULT;

    match command {
        Commands::Put {
            type_name,
            primary_key,
            body,
            indexes,
        } => {
            let mut set = IndexSet::new();
            for (name, values) in indexes {
                set = set.with(name, Value::new(values)?)?;
            }
            let (key, len) = db.put_and_get_key(
                &type_name,
                &Value::new(primary_key)?,
                body.as_bytes(),
                &set,
                write_options,
            )?;
            println!("{} ({} bytes)", escape(&key), len);
        }

        Commands::Get {
            type_name,
            primary_key,
        } => {
            let key = db.object_key(&type_name, &Value::new(primary_key)?)?;
            match db.get(&key, &read_options)? {
                Some(body) => println!("{}", escape(&body)),
                None => println!("(not found)"),
            }
        }

        Commands::Delete {
            type_name,
            primary_key,
        } => {
            let key = db.object_key(&type_name, &Value::new(primary_key)?)?;
            db.delete(&key, write_options)?;
            println!("OK");
        }

        Commands::Scan {
            type_name,
            index,
            value,
        } => {
            let mut cursor: DataCursor<LogStore> = match (type_name, index) {
                (Some(type_name), Some(index)) if value.is_empty() => db
                    .find_all_by_index(&type_name, &index, &read_options)?
                    .into(),
                (Some(type_name), Some(index)) => db
                    .find_by_index(&type_name, &index, &Value::new(value)?, false, &read_options)?
                    .into(),
                (Some(type_name), None) => db.find_by_type(&type_name, &read_options)?.into(),
                (None, _) => db.find_all(&read_options)?.into(),
            };

            let mut count = 0;
            while cursor.is_valid() {
                let key = escape(cursor.transient_key()?);
                let body = match cursor.transient_value()? {
                    Some(body) => escape(body),
                    None => "(missing)".to_string(),
                };
                println!("{} -> {}", key, body);
                count += 1;
                cursor.next()?;
            }
            println!("({} entries)", count);
        }

        Commands::Indexes {
            type_name,
            primary_key,
        } => {
            let key = db.object_key(&type_name, &Value::new(primary_key)?)?;
            for name in db.get_indexes_of(&key, &read_options)? {
                println!("{}", name);
            }
        }

        Commands::Dump => {
            let mut cursor = db.store().new_cursor(&read_options, None)?;
            cursor.seek_to_first();
            while let (Some(key), Some(value)) = (cursor.key(), cursor.value()) {
                println!("{} -> {}", escape(key), escape(value));
                cursor.next();
            }
        }
    }

    Ok(())
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ordodb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("OrdoDB CLI v{}", ordodb::VERSION);

    let config = Config::builder().data_dir(&args.data_dir).build();
    let db = match DataDb::open(config) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let write_options = if args.sync {
        WriteOptions::SYNC
    } else {
        WriteOptions::DEFAULT
    };

    let result = run(&db, args.command, &write_options);
    let closed = db.close();

    if let Err(e) = result.and(closed) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
