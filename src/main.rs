//! pagedb - embedded paged storage engine command line

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use pagedb::config::EngineConfig;
use pagedb::database::Database;
use pagedb::executor::{AggregateFunction, AggregateSpec};
use pagedb::planner::{QueryPlan, RangeFilter};
use pagedb::storage::PageLayout;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// pagedb - a paged record store with hash and B+Tree indexes
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page file
    #[arg(short, long, default_value = "pagedb.db")]
    file: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Page size in bytes
    #[arg(long, default_value = "4096")]
    page_size: usize,

    /// Slot directory entries per page
    #[arg(long, default_value = "512")]
    max_slots: usize,

    /// Pages held in the page cache
    #[arg(short, long, default_value = "10")]
    cache_capacity: usize,

    /// Slots in the hash index
    #[arg(long, default_value = "100")]
    hash_capacity: usize,

    /// Maximum keys per B+Tree node
    #[arg(long, default_value = "3")]
    btree_order: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append whitespace-separated integer key/value pairs from a file
    Load {
        input: PathBuf,
    },

    /// Scan, filter and aggregate the stored records
    Query {
        /// Column to group by
        #[arg(long)]
        group_by: Option<usize>,

        /// Column to sum
        #[arg(long)]
        sum: Option<usize>,

        /// Count rows per group
        #[arg(long)]
        count: bool,

        /// Column to take the minimum of
        #[arg(long)]
        min: Option<usize>,

        /// Column to take the maximum of
        #[arg(long)]
        max: Option<usize>,

        /// Column restricted to the open interval (lower, upper)
        #[arg(long, requires_all = ["lower", "upper"])]
        where_column: Option<usize>,

        #[arg(long, allow_hyphen_values = true)]
        lower: Option<i32>,

        #[arg(long, allow_hyphen_values = true)]
        upper: Option<i32>,
    },

    /// Compare hash and B+Tree range queries over [lower, upper]
    Range {
        #[arg(long, allow_hyphen_values = true)]
        lower: i32,

        #[arg(long, allow_hyphen_values = true)]
        upper: i32,
    },

    /// Print page, cache and index statistics
    Stats,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let layout = PageLayout::new(args.page_size, args.max_slots).context("Invalid page layout")?;
    let config = EngineConfig::new(layout)
        .with_cache_capacity(args.cache_capacity)
        .with_hash_capacity(args.hash_capacity)
        .with_btree_order(args.btree_order);

    let mut db = Database::open(&args.file, config)?;

    match args.command {
        Command::Load { input } => load(&mut db, &input),
        Command::Query {
            group_by,
            sum,
            count,
            min,
            max,
            where_column,
            lower,
            upper,
        } => {
            let mut plan = QueryPlan::new();
            if let (Some(column), Some(lower), Some(upper)) = (where_column, lower, upper) {
                plan = plan.with_filter(RangeFilter::new(column, lower, upper));
            }
            if let Some(column) = group_by {
                plan = plan.with_group_by(vec![column]);
            }
            if count {
                plan = plan.with_aggregate(AggregateSpec::count_star());
            }
            for (function, column) in [
                (AggregateFunction::Sum, sum),
                (AggregateFunction::Min, min),
                (AggregateFunction::Max, max),
            ] {
                if let Some(column) = column {
                    plan = plan.with_aggregate(AggregateSpec::new(function, Some(column)));
                }
            }
            query(&db, &plan)
        }
        Command::Range { lower, upper } => range(&mut db, lower, upper),
        Command::Stats => stats(&mut db),
    }
}

fn load(db: &mut Database, input: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let numbers = text
        .split_whitespace()
        .map(|token| {
            token
                .parse::<i32>()
                .with_context(|| format!("Invalid integer {:?}", token))
        })
        .collect::<Result<Vec<_>>>()?;
    if numbers.len() % 2 != 0 {
        bail!("Expected key/value pairs, got {} integers", numbers.len());
    }

    let started = Instant::now();
    for pair in numbers.chunks_exact(2) {
        db.insert_pair(pair[0], pair[1])?;
    }
    db.flush()?;

    println!(
        "Loaded {} records in {:?} ({} pages)",
        numbers.len() / 2,
        started.elapsed(),
        db.page_count()
    );
    Ok(())
}

fn query(db: &Database, plan: &QueryPlan) -> Result<()> {
    println!("Plan: {}", plan);
    let started = Instant::now();
    let rows = db.execute(plan)?;
    let elapsed = started.elapsed();

    for row in &rows {
        let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", fields.join("\t"));
    }
    println!("({} rows in {:?})", rows.len(), elapsed);
    Ok(())
}

fn range(db: &mut Database, lower: i32, upper: i32) -> Result<()> {
    db.build_indexes()?;

    let started = Instant::now();
    let hashed = db.range_query_hash(lower, upper);
    let hash_elapsed = started.elapsed();

    let started = Instant::now();
    let ordered = db.range_query_ordered(lower, upper);
    let ordered_elapsed = started.elapsed();

    println!(
        "Hash index:    {} values in {:?}: {:?}",
        hashed.len(),
        hash_elapsed,
        hashed
    );
    println!(
        "B+Tree index:  {} values in {:?}: {:?}",
        ordered.len(),
        ordered_elapsed,
        ordered
    );
    Ok(())
}

fn stats(db: &mut Database) -> Result<()> {
    let indexed = db.build_indexes()?;
    let cache = db.cache_stats();
    let tree = db.ordered_index().get_statistics();

    println!("Pages:           {}", db.page_count());
    println!("Indexed rows:    {}", indexed);
    println!(
        "Hash index:      {} / {} slots",
        db.hash_index().len(),
        db.hash_index().capacity()
    );
    println!(
        "B+Tree:          {} keys, height {}, {} leaves, {} internal nodes",
        tree.entry_count, tree.height, tree.leaf_count, tree.internal_count
    );
    println!(
        "Cache:           {} hits, {} misses, {} evictions, {} flushes ({:.1}% hit ratio)",
        cache.hits,
        cache.misses,
        cache.evictions,
        cache.flushes,
        cache.hit_ratio() * 100.0
    );

    let mut sums = db.group_sums();
    sums.sort_unstable();
    println!("Group sums:");
    for (key, sum) in sums {
        println!("  {}\t{}", key, sum);
    }
    Ok(())
}
