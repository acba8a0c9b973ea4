//! Example: Subscribe to status changes and print them as they arrive.

use lares4::{ClientConfig, ConnectionState, Lares4Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::builder()
        .host("192.168.1.100")
        .sender("events-demo")
        .pin("123456")
        .build();

    let mut client = Lares4Client::connect(config).await?;
    let mut outputs = client.subscribe_outputs();
    let mut sensors = client.subscribe_sensors();
    let mut temperatures = client.subscribe_temperatures();
    let mut connection = client.watch_connection();

    println!("Listening for status changes (Ctrl+C to stop)...\n");

    loop {
        tokio::select! {
            Ok(change) = outputs.recv() => {
                println!("Output #{}: {}", change.position, change.status);
            }
            Ok(change) = sensors.recv() => {
                println!("Sensor #{}: {}", change.position, change.status);
            }
            Ok(change) = temperatures.recv() => {
                println!("Temperature #{}: {}", change.position, change.status);
            }
            _ = connection.wait_for(|state| *state == ConnectionState::Closed) => {
                println!("Panel disconnected!");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nDisconnecting...");
                break;
            }
        }
    }

    client.close().await?;
    Ok(())
}
