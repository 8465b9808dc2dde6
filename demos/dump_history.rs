// Print one stored series as pretty JSON (raw UTC keys, no display conversion).
//
// Usage: cargo run --example dump_history -- [DATA_DIR] [hourly|daily|monthly]
//   DATA_DIR     default: ./data
//   GRANULARITY  default: hourly

use hostmon::history_repo::{HistoryRepo, Retention};
use hostmon::models::Granularity;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let data_dir = args.get(1).map(String::as_str).unwrap_or("./data");
    let granularity = match args.get(2).map(String::as_str).unwrap_or("hourly") {
        "hourly" => Granularity::Hourly,
        "daily" => Granularity::Daily,
        "monthly" => Granularity::Monthly,
        other => anyhow::bail!("unknown granularity {:?} (expected hourly, daily or monthly)", other),
    };

    let repo = HistoryRepo::open(data_dir, Retention::default())?;
    let records = repo.read_series(granularity).await?.unwrap_or_default();

    eprintln!("{}: {} records", repo.path(granularity).display(), records.len());
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
