use colored::Colorize;
use flexinfra_config::{InfraConfig, ProviderKind};

pub async fn handle(config: &InfraConfig, no_check: bool) -> anyhow::Result<()> {
    if !no_check {
        for kind in ProviderKind::ALL {
            if config.providers.values().any(|p| p.kind == kind) {
                flexinfra::check_cli_installed(kind).await?;
            }
        }
    }

    println!("{}", "Provisioning networks...".blue());
    let mut infra = flexinfra::build_infra(config, flexinfra::cli_engine).await?;
    for (name, provider) in infra.providers() {
        println!(
            "  {} {} ({}, {} subnets)",
            "✓".green(),
            name.cyan(),
            provider.display_name(),
            provider.subnets().len()
        );
    }

    println!("{}", "Provisioning servers...".blue());
    let provisioned = flexinfra::provision_all(&mut infra, config).await?;
    for server in &provisioned {
        println!(
            "  {} {} (ID: {}, {} / {})",
            "✓".green(),
            server.name().cyan(),
            server.id(),
            server.server_type,
            server.image
        );
    }

    println!();
    println!(
        "{}",
        format!("✓ {} servers provisioned", provisioned.len())
            .green()
            .bold()
    );
    Ok(())
}
