use anyhow::Result;
use std::env;

use account_book::{RecordManager, StatisticsEngine, TrendPeriod};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("summary") => {
            let json = args.iter().any(|a| a == "--json");
            run_summary(json)?;
        }
        Some("trend") => {
            let period = args
                .get(2)
                .and_then(|s| TrendPeriod::parse(s))
                .unwrap_or(TrendPeriod::Month);
            run_trend(period)?;
        }
        Some("export") => match args.get(2) {
            Some(path) => run_export(path)?,
            None => {
                eprintln!("Usage: account-book export <file.csv>");
                std::process::exit(1);
            }
        },
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: account-book [summary [--json] | trend [day|week|month] | export <file.csv>]");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn open_engine() -> Result<StatisticsEngine> {
    Ok(StatisticsEngine::new(RecordManager::open_default()?))
}

fn run_summary(json: bool) -> Result<()> {
    let engine = open_engine()?;

    let daily = engine.daily_summary(None)?;
    let weekly = engine.weekly_summary(None)?;
    let monthly = engine.monthly_summary(None, None)?;
    let top = engine.top_expenses(3, None, None)?;

    if json {
        let output = serde_json::json!({
            "daily": daily,
            "weekly": weekly,
            "monthly": monthly,
            "top_expenses": top,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("📒 Account Book Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (label, summary) in [("Today", daily), ("This week", weekly), ("This month", monthly)] {
        println!(
            "{:<11} income {:>10.2}  expense {:>10.2}  balance {:>10.2}",
            label, summary.total_income, summary.total_expense, summary.balance
        );
    }

    if !top.is_empty() {
        println!("\nTop expense categories:");
        for (category, amount) in &top {
            println!("  {:<16} {:>10.2}", category, amount);
        }
    }

    Ok(())
}

fn run_trend(period: TrendPeriod) -> Result<()> {
    let engine = open_engine()?;
    let trend = engine.trend_data(period, 6)?;

    println!("📈 Trend ({:?}, last {} periods)", period, trend.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for point in &trend {
        println!(
            "{:<13} income {:>10.2}  expense {:>10.2}",
            point.period, point.income, point.expense
        );
    }

    Ok(())
}

fn run_export(path: &str) -> Result<()> {
    let engine = open_engine()?;

    println!("💾 Exporting records to {}...", path);
    let written = engine.manager().storage().export_csv(path, None)?;
    println!("✓ Exported {} records", written);

    Ok(())
}
