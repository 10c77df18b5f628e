use crate::utils::config::{self, AppConfig};
use colored::Colorize;
use miette::Result;
use rmx_texture::CollisionPolicy;
use rmx_usda::{DEFAULT_OUTPUT_NAME, DEFAULT_ROOT_DOCUMENT};

/// Print a config entry, falling back to the built-in default
fn print_entry(name: &str, value: Option<String>, default: &str) {
    match value {
        Some(v) => println!("  {} {}", format!("{}:", name).bright_white(), v.bright_green()),
        None => println!(
            "  {} {} {}",
            format!("{}:", name).bright_white(),
            default,
            "(default)".bright_yellow()
        ),
    }
}

fn policy_name(policy: CollisionPolicy) -> &'static str {
    match policy {
        CollisionPolicy::KeepFirst => "keep-first",
        CollisionPolicy::Error => "error",
    }
}

pub fn show_config() -> Result<()> {
    let cfg = config::load_config();
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    print_entry("output", cfg.output, DEFAULT_OUTPUT_NAME);
    print_entry("root_document", cfg.root_document, DEFAULT_ROOT_DOCUMENT);
    match &cfg.reference_directory {
        Some(dir) => {
            let status = if dir.is_dir() {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", "reference_directory:".bright_white(), dir, status);
        }
        None => println!(
            "  {} {}",
            "reference_directory:".bright_white(),
            "(not set)".bright_yellow()
        ),
    }
    print_entry("recursive", cfg.recursive.map(|r| r.to_string()), "false");
    print_entry(
        "collision_policy",
        cfg.collision_policy.map(|p| policy_name(p).to_string()),
        policy_name(CollisionPolicy::default()),
    );

    println!();
    Ok(())
}

pub fn reset_config() -> Result<()> {
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    config::save_config(&AppConfig::default())
        .map_err(|e| miette::miette!("Failed to reset config: {}", e))?;

    println!(
        "{}",
        "✓ Configuration reset to defaults".bright_green().bold()
    );
    println!();
    println!("  {} {}", "Config file:".bright_white().bold(), config_path);

    Ok(())
}
