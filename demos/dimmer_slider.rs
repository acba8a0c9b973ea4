//! Example: Drive a dimmer from a burst of slider positions without
//! flooding the panel.
//!
//! Every position goes through an `ActionGate`: only the last value of a
//! burst is sent, and nothing is sent for a while after each command.

use std::sync::Arc;

use lares4::{ActionGate, ClientConfig, Lares4Client, OutputValue};
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::builder()
        .host("192.168.1.100")
        .sender("slider-demo")
        .pin("123456")
        .build();

    let client = Arc::new(Lares4Client::connect(config).await?);

    let Some(dimmer) = client.dimmers().await.into_iter().next() else {
        println!("No dimmers on this panel");
        return Ok(());
    };
    println!("Sliding {} (#{})", dimmer.details.description, dimmer.position);

    let gate = ActionGate::new(Duration::from_millis(300));
    let lock_duration = Duration::from_secs(1);

    // simulate a user dragging the slider from 0 to 100
    for level in (0..=100u8).step_by(5) {
        let client = Arc::clone(&client);
        let id = dimmer.details.id.clone();
        let accepted = gate.invoke(lock_duration, move || async move {
            println!("Setting level {}", level);
            if let Err(e) = client.set_output(&id, OutputValue::Level(level)).await {
                eprintln!("Failed to set level {}: {}", level, e);
            }
        });
        if !accepted {
            println!("Level {} dropped (locked)", level);
        }
        sleep(Duration::from_millis(50)).await;
    }

    // let the last command go out
    sleep(Duration::from_secs(2)).await;

    let status = client.output_status(&dimmer.details.id).await;
    println!("Final status: {:?}", status.map(|s| s.to_string()));
    Ok(())
}
