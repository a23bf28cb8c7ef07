//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `academy_core` linkage, configuration and database bootstrap.
//! - Print deterministic `key=value` lines for quick local sanity checks.

use academy_core::db::migrations::current_version;
use academy_core::repo::SqliteNewsRepository;
use academy_core::{
    core_version, listing_counts, CoreConfig, EntityKind, EntityRepository, ListQuery,
};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("academy_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoreConfig::from_env()?;
    let logging = config.init_logging()?;
    let conn = config.open_db()?;

    println!("academy_core version={}", core_version());
    println!("schema_version={}", current_version(&conn)?);
    println!("logging={}", if logging { "file" } else { "off" });

    let counts = listing_counts(&conn, false)?;
    for kind in EntityKind::ALL {
        println!("listed {kind}={}", counts.get(kind));
    }

    let news = SqliteNewsRepository::try_new(&conn)?.with_page_limits(config.page_limits());
    let first_page = news.list(&ListQuery::default())?;
    println!(
        "news_page size={} shown={} pages={}",
        first_page.page_size,
        first_page.items.len(),
        first_page.page_count()
    );

    info!("event=cli_probe module=cli status=ok");
    Ok(())
}
