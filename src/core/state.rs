use crate::core::error::WorkflowError;
use crate::core::model::{AudioArtifact, Image, Prompt, Scene, VideoArtifact};
use crate::core::pipeline::Stage;

pub const MAX_STEP: u8 = 5;

const PROGRESS_LABELS: [&str; MAX_STEP as usize + 1] = [
    "Ready to start",
    "Script analysis complete",
    "Prompts generated",
    "Images created",
    "Audio generated",
    "Video ready for download",
];

/// Step panels, one visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Script = 1,
    Prompts = 2,
    Images = 3,
    Audio = 4,
    Video = 5,
}

impl Step {
    pub const ALL: [Step; MAX_STEP as usize] = [
        Step::Script,
        Step::Prompts,
        Step::Images,
        Step::Audio,
        Step::Video,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Step> {
        Step::ALL.into_iter().find(|s| s.number() == n)
    }

    pub fn next(self) -> Option<Step> {
        Step::from_number(self.number() + 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Script => "Teaching script",
            Step::Prompts => "Scene prompts",
            Step::Images => "Scene images",
            Step::Audio => "Narration",
            Step::Video => "Your teaching video",
        }
    }

    /// Exactly one panel, the current step's, is shown at a time.
    pub fn is_shown_on(self, current: Step) -> bool {
        self == current
    }

    /// Element id of the step panel.
    pub fn panel_id(self) -> String {
        format!("step-{}", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub step: u8,
    pub percentage: u8,
    pub label: &'static str,
}

impl Progress {
    pub fn for_step(step: u8) -> Self {
        let step = step.min(MAX_STEP);
        Self {
            step,
            percentage: (u32::from(step) * 100 / u32::from(MAX_STEP)) as u8,
            label: PROGRESS_LABELS[step as usize],
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowState {
    current_step: Step,
    pub script: Option<String>,
    pub scenes: Vec<Scene>,
    pub prompts: Vec<Prompt>,
    pub images: Vec<Image>,
    pub audio: Option<AudioArtifact>,
    pub video: Option<VideoArtifact>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            current_step: Step::Script,
            script: None,
            scenes: Vec::new(),
            prompts: Vec::new(),
            images: Vec::new(),
            audio: None,
            video: None,
        }
    }
}

impl WorkflowState {
    pub fn current_step(&self) -> Step {
        self.current_step
    }

    pub fn progress(&self) -> Progress {
        Progress::for_step(self.current_step.number())
    }

    /// Panel visibility: exactly the current step's panel is active.
    pub fn is_panel_active(&self, step: Step) -> bool {
        step.is_shown_on(self.current_step)
    }

    pub fn is_armed(&self, stage: Stage) -> bool {
        stage.required_step() == self.current_step
    }

    pub fn ensure_armed(&self, stage: Stage) -> Result<(), WorkflowError> {
        if self.is_armed(stage) {
            Ok(())
        } else {
            Err(WorkflowError::validation(format!(
                "{} is not available at this step.",
                stage.name()
            )))
        }
    }

    pub fn armed_stages(&self) -> Vec<Stage> {
        Stage::ALL.into_iter().filter(|s| self.is_armed(*s)).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.current_step == Step::Video
    }

    /// Moves forward by exactly one step.
    pub fn advance_to(&mut self, step: Step) -> Result<(), WorkflowError> {
        if self.current_step.next() != Some(step) {
            return Err(WorkflowError::validation(format!(
                "cannot move from step {} to step {}",
                self.current_step.number(),
                step.number()
            )));
        }
        self.current_step = step;
        Ok(())
    }
}
