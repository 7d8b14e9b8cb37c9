use colored::Colorize;
use flexinfra_cloud::{MemoryEngine, ResourceEngine};
use flexinfra_config::InfraConfig;
use std::sync::Arc;

/// Dry run on an in-memory engine
pub async fn handle(config: &InfraConfig) -> anyhow::Result<()> {
    println!("{}", "Planning...".blue());

    let engine = Arc::new(MemoryEngine::new());
    let mut infra = flexinfra::build_infra(config, |_| {
        engine.clone() as Arc<dyn ResourceEngine>
    })
    .await?;
    let provisioned = flexinfra::provision_all(&mut infra, config).await?;

    println!();
    for declaration in engine.declarations() {
        println!(
            "  {} {} {}",
            "+".green(),
            declaration.resource_type.bold(),
            declaration.name.cyan()
        );
        for (key, value) in &declaration.properties {
            println!("      {} = {}", key, value);
        }
    }

    println!();
    println!(
        "{}",
        format!(
            "{} resources, {} servers",
            engine.len(),
            provisioned.len()
        )
        .green()
        .bold()
    );
    for server in &provisioned {
        println!(
            "  - {} → {} / {}",
            server.name().cyan(),
            server.server_type,
            server.image
        );
    }

    Ok(())
}
