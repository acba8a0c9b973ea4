//! Example: Connect to a Lares4 panel and print what it reports.

use lares4::{ClientConfig, Lares4Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::builder()
        .host("192.168.1.100")
        .sender("connect-demo")
        .pin("123456")
        .build();

    println!("Connecting to panel...");
    let mut client = Lares4Client::connect(config).await?;

    let lights = client.lights().await;
    println!("\n--- Lights ({}) ---", lights.len());
    for light in &lights {
        let status = client.output_status(&light.details.id).await;
        println!(
            "  #{:3}: {:24} {}",
            light.position,
            light.details.description,
            status.map(|s| s.state).unwrap_or_default(),
        );
    }

    let dimmers = client.dimmers().await;
    println!("\n--- Dimmers ({}) ---", dimmers.len());
    for dimmer in &dimmers {
        let level = client
            .output_status(&dimmer.details.id)
            .await
            .and_then(|s| s.position);
        println!(
            "  #{:3}: {:24} level={}",
            dimmer.position,
            dimmer.details.description,
            level.unwrap_or_default(),
        );
    }

    let shutters = client.shutters().await;
    println!("\n--- Shutters ({}) ---", shutters.len());
    for shutter in &shutters {
        println!("  #{:3}: {}", shutter.position, shutter.details.description);
    }

    let scenarios = client.user_scenarios().await;
    println!("\n--- Scenarios ({}) ---", scenarios.len());
    for scenario in &scenarios {
        println!(
            "  #{:3}: {:24} category={}",
            scenario.position, scenario.details.description, scenario.details.category,
        );
    }

    let thermostats = client.thermostats().await;
    println!("\n--- Thermostats ({}) ---", thermostats.len());
    for thermostat in &thermostats {
        println!("  #{:3}: {}", thermostat.sensor.position, thermostat.sensor.details);
        if let Some(configuration) = &thermostat.configuration {
            println!(
                "        mode={} season={} manual hours={}",
                configuration.details.mode,
                configuration.details.season,
                configuration.details.manual_hours,
            );
        }
    }

    println!("\n--- System ---");
    for system in client.systems().await {
        println!("  {}", system);
        println!("  Armed: {} ({})", system.arm.description, system.arm.state);
    }

    println!("\nPress Ctrl+C to disconnect...");
    tokio::signal::ctrl_c().await?;
    client.close().await?;
    println!("Disconnected.");

    Ok(())
}
