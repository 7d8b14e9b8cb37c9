use colored::Colorize;
use flexinfra_cloud::{Infra, MemoryEngine, ResourceEngine};
use flexinfra_config::InfraConfig;
use std::sync::Arc;

pub fn handle(config: &InfraConfig) -> anyhow::Result<()> {
    let engine: Arc<dyn ResourceEngine> = Arc::new(MemoryEngine::new());
    let mut infra = Infra::new();
    for (name, entry) in &config.providers {
        infra.add_provider(name.clone(), flexinfra::build_provider(entry, engine.clone()));
    }

    if let Err(e) = infra.deploy() {
        eprintln!("{}", "✗ Deploy failed".red().bold());
        eprintln!("  {}", e);
        return Err(e.into());
    }
    Ok(())
}
