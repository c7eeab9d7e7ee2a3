//! A walkthrough of trywise pipelines.
//!
//! Run with `cargo run --example pipeline`.

use std::time::Duration;

use trywise::{ensure, ErrorKind, Fault, Maybe, Try};

#[derive(Debug, thiserror::Error)]
#[error("account {0} is frozen")]
struct Frozen(u32);

impl trywise::Classify for Frozen {
    fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidOperation
    }
}

fn parse_amount(raw: &str) -> Result<u64, Fault> {
    let amount: u64 = raw.trim().parse()?;
    ensure!(amount > 0, ArgumentOutOfRange, "amount must be positive");
    Ok(amount)
}

async fn lookup_balance(account: u32) -> Result<u64, Fault> {
    if account == 13 {
        return Err(Frozen(account).into());
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
    Ok(u64::from(account) * 100)
}

async fn lookup_with_timeout(account: u32, limit: Duration) -> Result<u64, Fault> {
    let slow_lookup = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        lookup_balance(account).await
    };
    tokio::time::timeout(limit, slow_lookup)
        .await
        .map_err(|elapsed| Fault::new(ErrorKind::Timeout, elapsed))?
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Fault> {
    // Synchronous pipeline: parse, recover from bad input.
    let amount = |raw: &'static str| {
        Try::of(move || parse_amount(raw)).catch_kind(ErrorKind::Format, |fault| {
            println!("  could not parse: {fault}");
            Ok(0)
        })
    };
    for raw in ["250", "12abc", "0"] {
        match amount(raw).execute() {
            Ok(value) => println!("amount({raw:?}) = {value}"),
            Err(fault) => println!("amount({raw:?}) failed [{}]: {fault}", fault.kind()),
        }
    }

    // Promotion: an async step turns the pipeline into an AsyncTry.
    for account in [7, 13] {
        let balance = Try::of(move || Ok(account))
            .then_async(lookup_balance)
            .catch::<Frozen, _>(|frozen| {
                println!("  {frozen}, reporting an empty balance");
                Ok(0)
            });
        let result: Maybe<u64> = balance.await?;
        println!("balance({account}) = {result}");
    }

    // A timeout is an ordinary fault, caught as a cancellation.
    let slow = Try::of(|| Ok(1))
        .then_async(|account| lookup_with_timeout(account, Duration::from_millis(1)))
        .catch_kind(ErrorKind::Cancelled, |fault| {
            println!("  gave up: {fault}");
            Ok(0)
        });
    println!("slow balance = {}", slow.await?);

    Ok(())
}
