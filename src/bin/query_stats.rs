//! Run a stats query from the command line
//! Usage: cargo run --bin query_stats -- [request.json] [--today YYYY-MM-DD]
//!
//! Reads the request JSON from the file, or from stdin when no file is given,
//! and prints the response JSON.

use std::io::Read;

use chrono::NaiveDate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut path = None;
    let mut today = chrono::Local::now().date_naive();
    while let Some(arg) = args.next() {
        if arg == "--today" {
            let value = args.next().ok_or("--today requires a date")?;
            today = NaiveDate::parse_from_str(&value, "%Y-%m-%d")?;
        } else {
            path = Some(arg);
        }
    }

    let raw = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let request: fitlog::stats::StatsQueryRequest = serde_json::from_str(&raw)?;

    let db_path = fitlog::config::database_path();
    eprintln!("Database: {}", db_path.display());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = fitlog::db::Database::new(&db_path)?;
    database.with_conn(fitlog::db::run_migrations)?;

    let response = fitlog::stats::execute(&database, &request, today)?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
