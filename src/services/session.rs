use crate::core::config::Config;
use crate::core::io::Storage;
use crate::core::pipeline::Stage;
use crate::services::export::export_artifacts;
use crate::services::workflow::WorkflowController;
use anyhow::Result;
use inquire::Select;
use log::{info, warn};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Run(Stage),
    /// Switch to the given level (`true` for AI analysis).
    ToggleEnhancement(bool),
    Quit,
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuAction::Run(stage) => f.write_str(stage.name()),
            MenuAction::ToggleEnhancement(true) => f.write_str("Switch to Advanced AI analysis"),
            MenuAction::ToggleEnhancement(false) => f.write_str("Switch to Template-based"),
            MenuAction::Quit => f.write_str("Quit"),
        }
    }
}

fn menu(controller: &WorkflowController) -> Vec<MenuAction> {
    let enabled = controller.enhancement().map(|s| s.enabled).unwrap_or(false);
    let mut actions: Vec<MenuAction> = controller
        .available_actions()
        .into_iter()
        .map(MenuAction::Run)
        .collect();
    actions.push(MenuAction::ToggleEnhancement(!enabled));
    actions.push(MenuAction::Quit);
    actions
}

/// Switches the backend to the configured level if it reports another one.
pub async fn apply_enhancement_preference(
    controller: &mut WorkflowController,
    preference: Option<bool>,
) {
    let Some(wanted) = preference else {
        return;
    };
    if controller.enhancement().map(|s| s.enabled) == Some(wanted) {
        return;
    }
    if let Err(e) = controller.toggle_enhancement(wanted).await {
        warn!("Keeping the backend's enhancement level: {}", e);
    }
}

/// Drives the workflow to the end, from a menu or unattended, then exports
/// the artifacts when `download` is set.
pub async fn run_session(
    controller: &mut WorkflowController,
    config: &Config,
    script: &str,
    storage: &dyn Storage,
) -> Result<()> {
    apply_enhancement_preference(controller, config.enhancement).await;

    if config.unattended {
        controller.run_all(script).await?;
    } else if !run_interactive(controller, script).await? {
        info!("Session ended before the video was created");
        return Ok(());
    }

    if config.download {
        let summary = export_artifacts(
            controller.backend(),
            storage,
            controller.state(),
            &config.output_folder,
            config.download_concurrency,
        )
        .await?;
        println!(
            "Saved {} files to {} (open {})",
            summary.files.len(),
            config.output_folder,
            summary.index
        );
    }
    Ok(())
}

/// Returns `false` when the user quits before the last step.
async fn run_interactive(controller: &mut WorkflowController, script: &str) -> Result<bool> {
    while !controller.state().is_complete() {
        let step = controller.state().current_step();
        let prompt = format!("Step {}: {}", step.number(), step.title());
        match Select::new(&prompt, menu(controller)).prompt()? {
            // Failures are already reported by the controller; the menu comes back for a retry.
            MenuAction::Run(stage) => {
                let _ = controller.run_stage(stage, script).await;
            }
            MenuAction::ToggleEnhancement(wanted) => {
                let _ = controller.toggle_enhancement(wanted).await;
            }
            MenuAction::Quit => return Ok(false),
        }
    }
    Ok(true)
}
