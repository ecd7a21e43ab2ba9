//! Contention Tool
//!
//! Races concurrent charges against a single point balance and reports how
//! many went through, how many gave up on version conflicts, and whether the
//! history table kept up.
//!
//! Run with: cargo run --bin contention --release -- --writers 50

use std::sync::Arc;
use std::time::Instant;

use point_ledger::service::ChargePointCommand;
use point_ledger::{app, db, Config, LockMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let writers: u64 = args
        .iter()
        .position(|a| a == "--writers")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(50);

    let config = Config::from_env()?;

    println!("Contention Test - {} concurrent writers", writers);
    println!("Connecting to database...");

    let pool = db::connect(&config).await?;
    let transport = app::build_transport(&config)?;
    let service = Arc::new(app::build_point_service(pool, transport)?);

    let point_id = service.ledger().open_account(None).await?.id;
    let start = Instant::now();

    let mut handles = Vec::with_capacity(writers as usize);
    for i in 0..writers {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .charge(
                    ChargePointCommand::new(point_id, "1")
                        .with_transaction_id(format!("contention-{}-{}", point_id, i)),
                )
                .await
        }));
    }

    let mut succeeded = 0u64;
    let mut conflicted = 0u64;
    let mut failed = 0u64;
    let mut retries = 0u64;

    for handle in handles {
        match handle.await? {
            Ok(result) => {
                succeeded += 1;
                retries += u64::from(result.attempts - 1);
            }
            Err(e) if e.is_retryable() => conflicted += 1,
            Err(e) => {
                failed += 1;
                eprintln!("Charge failed: {}", e);
            }
        }
    }

    let elapsed = start.elapsed();
    let final_state = service.ledger().get_balance(point_id, LockMode::None).await?;
    let history = service.ledger().history(point_id).await?;

    println!("\n=== Contention Results ===");
    println!("Point id: {}", point_id);
    println!("Succeeded: {}", succeeded);
    println!("Gave up on conflict: {}", conflicted);
    println!("Other failures: {}", failed);
    println!("Retries: {}", retries);
    println!("Final amount: {}", final_state.amount);
    println!("Final version: {}", final_state.version);
    println!("History rows: {}", history.len());
    println!("Time: {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
