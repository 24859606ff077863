mod board;
mod config;
mod filter;
mod form;
mod models;
mod normalize;
mod raw;
mod store;
mod tui;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use board::Board;
use config::Config;
use models::{FilterCriteria, Listing, PostForm};
use store::SqliteStore;

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(about = "Post job listings and search them by keyword, wage and date")]
struct Cli {
    /// Database file (defaults to $JOBBOARD_DB or the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Post a new listing
    Post {
        #[arg(short, long)]
        title: String,

        /// Free-form tag or category
        #[arg(short, long, default_value = "")]
        keyword: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Hourly wage
        #[arg(short, long)]
        wage: String,

        /// First day of the posting window (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last day of the posting window (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List listings, optionally filtered
    List {
        /// Case-insensitive text to look for in keyword, title and description
        #[arg(short, long, default_value = "")]
        keyword: String,

        /// Minimum hourly wage
        #[arg(short, long, default_value = "")]
        min_wage: String,

        /// Only listings whose period contains this day (YYYY-MM-DD)
        #[arg(short, long, default_value = "")]
        date: String,

        /// Print matching listings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show listing details
    Show {
        /// Listing ID
        id: String,
    },

    /// Browse listings interactively
    Browse,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,jobboard=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.db.as_deref());
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let store = SqliteStore::open(&config.db_path, &config.collection)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;

    match cli.command {
        Commands::Init => {
            store.init()?;
            println!("Database initialized at {}", config.db_path.display());
        }

        Commands::Post {
            title,
            keyword,
            description,
            wage,
            start,
            end,
            yes,
        } => {
            let form = PostForm {
                title,
                keyword,
                description,
                wage,
                start_date: start,
                end_date: end,
            };
            form.validate()?;

            println!("Please confirm:");
            for (label, value) in form.summary() {
                println!("  {:<12} {}", format!("{}:", label), value);
            }
            if !yes && !confirm("Post this listing?")? {
                println!("Cancelled, nothing was posted.");
                return Ok(());
            }

            let mut board = open_board(store)?;
            let id = board.submit(&form).context("Failed to post listing")?;
            println!("Posted listing #{}", id);
        }

        Commands::List {
            keyword,
            min_wage,
            date,
            json,
        } => {
            let mut board = open_board(store)?;
            board.refresh().context("Failed to load listings")?;
            let criteria = FilterCriteria {
                keyword,
                min_wage,
                date,
            };
            let listings = board.filtered(&criteria);

            if json {
                println!("{}", serde_json::to_string_pretty(&listings)?);
            } else if listings.is_empty() {
                println!("No listings match.");
            } else {
                print_table(&listings);
                if !criteria.is_empty() {
                    println!("\n{} of {} listing(s) match.", listings.len(), board.listings().len());
                }
            }
        }

        Commands::Show { id } => {
            let mut board = open_board(store)?;
            board.refresh().context("Failed to load listings")?;
            let listing = board
                .get(&id)
                .ok_or_else(|| anyhow!("Listing #{} not found", id))?;
            print_listing(listing);
        }

        Commands::Browse => {
            let mut board = open_board(store)?;
            tui::run_browse(&mut board)?;
        }
    }

    Ok(())
}

fn open_board(store: SqliteStore) -> Result<Board<SqliteStore>> {
    store.ensure_initialized()?;
    Ok(Board::new(store))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_table(listings: &[&Listing]) {
    println!(
        "{:<22} {:<28} {:<14} {:>10} {:<23}",
        "ID", "TITLE", "KEYWORD", "WAGE", "PERIOD"
    );
    println!("{}", "-".repeat(100));
    for listing in listings {
        println!(
            "{:<22} {:<28} {:<14} {:>10} {:<23}",
            listing.id,
            truncate(&listing.title, 26),
            truncate(&listing.keyword, 12),
            format_wage(listing.wage),
            format_period(listing)
        );
    }
}

fn print_listing(listing: &Listing) {
    println!("Listing #{}", listing.id);
    println!("Title: {}", listing.title);
    if !listing.keyword.is_empty() {
        println!("Keyword: {}", listing.keyword);
    }
    println!("Wage: {}/h", format_wage(listing.wage));
    println!("Period: {}", format_period(listing));
    if let Some(created) = &listing.created_at {
        println!("Posted: {}", created.display());
    }
    if !listing.description.is_empty() {
        println!("\n{}", textwrap::fill(&listing.description, 80));
    }
}

fn format_period(listing: &Listing) -> String {
    format!(
        "{} ~ {}",
        listing.start_date.as_deref().unwrap_or("not set"),
        listing.end_date.as_deref().unwrap_or("not set")
    )
}

fn format_wage(wage: f64) -> String {
    if wage.fract() == 0.0 && wage.is_finite() {
        format!("{:.0}", wage)
    } else {
        format!("{}", wage)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title here", 10), "a longe...");
        assert_eq!(truncate("カフェスタッフ募集中です", 8), "カフェスタ...");
    }

    #[test]
    fn test_format_wage() {
        assert_eq!(format_wage(1200.0), "1200");
        assert_eq!(format_wage(1200.5), "1200.5");
        assert_eq!(format_wage(f64::INFINITY), "inf");
    }

    #[test]
    fn test_cli_parses_list_filters() {
        let cli = Cli::try_parse_from([
            "jobboard", "--db", "/tmp/x.db", "list", "--keyword", "cafe", "--min-wage", "1000",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Commands::List {
                keyword,
                min_wage,
                date,
                json,
            } => {
                assert_eq!(keyword, "cafe");
                assert_eq!(min_wage, "1000");
                assert_eq!(date, "");
                assert!(!json);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_cli_post_requires_dates() {
        let result = Cli::try_parse_from(["jobboard", "post", "--title", "Cafe", "--wage", "1000"]);
        assert!(result.is_err());
    }
}
