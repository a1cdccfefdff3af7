use crate::core::config::Config;
use crate::core::view::{ADVANCED_DESCRIPTION, TEMPLATE_DESCRIPTION};
use anyhow::Result;
use inquire::{Select, Text};
use std::path::Path;

const ADVANCED_OPTION: &str = "Advanced AI analysis";
const TEMPLATE_OPTION: &str = "Template-based";

/// Asks for whatever the config leaves open and saves the answers back.
/// Unattended runs never prompt.
pub fn run_setup(config: &mut Config) -> Result<()> {
    if config.unattended {
        return Ok(());
    }

    let mut needs_save = false;

    if config.enhancement.is_none() {
        config.enhancement = Some(select_enhancement()?);
        needs_save = true;
    }

    if !Path::new(&config.script_file).exists() {
        println!("Script file not found: {}", config.script_file);
        let path = Text::new("Path to the teaching script:")
            .with_default(&config.script_file)
            .prompt()?;
        config.script_file = path.trim().to_string();
        needs_save = true;
    }

    if needs_save {
        config.save()?;
        println!("Configuration saved.");
    }

    Ok(())
}

fn select_enhancement() -> Result<bool> {
    let options = vec![
        format!("{} - {}", ADVANCED_OPTION, ADVANCED_DESCRIPTION),
        format!("{} - {}", TEMPLATE_OPTION, TEMPLATE_DESCRIPTION),
    ];
    let selection = Select::new("Select prompt enhancement level:", options).prompt()?;
    Ok(selection.starts_with(ADVANCED_OPTION))
}
