use colored::Colorize;
use flexinfra_config::InfraConfig;
use std::path::Path;

pub fn handle(path: &Path, config: &InfraConfig) -> anyhow::Result<()> {
    println!("{}", "Validating infrastructure...".blue());
    println!("File: {}", path.display().to_string().cyan());

    let problems = flexinfra::check(config);
    if !problems.is_empty() {
        eprintln!();
        eprintln!("{}", "✗ Invalid configuration".red().bold());
        for problem in &problems {
            eprintln!("  {}", problem);
        }
        anyhow::bail!("{} problem(s) found", problems.len());
    }

    println!("{}", "✓ Configuration is valid".green().bold());
    println!();
    println!("Summary:");
    println!("  Providers: {}", config.providers.len());
    for (name, entry) in &config.providers {
        let location = entry.provider_config.location.as_deref().unwrap_or("(unset)");
        println!(
            "    - {} ({}, location: {}, {} subnets)",
            name.cyan(),
            entry.kind,
            location,
            entry.provider_config.network_config.subnets.len()
        );
    }
    println!("  Servers: {}", config.servers.len());
    for entry in &config.servers {
        println!(
            "    - {} ({} / {} on {})",
            entry.server.name().cyan(),
            entry.server.size(),
            entry.server.image(),
            entry.provider
        );
    }

    Ok(())
}
