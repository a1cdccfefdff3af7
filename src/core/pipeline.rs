use crate::core::state::Step;

/// One remote operation of the workflow, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    SplitScript,
    GeneratePrompts,
    GenerateImages,
    GenerateAudio,
    CreateVideo,
}

/// What happens after a stage succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Run the next stage right away, inside the same user action.
    Chain(Stage),
    /// Arm the next stage and wait for the user to trigger it.
    AwaitUser(Stage),
    Done,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::SplitScript,
        Stage::GeneratePrompts,
        Stage::GenerateImages,
        Stage::GenerateAudio,
        Stage::CreateVideo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::SplitScript => "Split script",
            Stage::GeneratePrompts => "Generate prompts",
            Stage::GenerateImages => "Generate images",
            Stage::GenerateAudio => "Generate audio",
            Stage::CreateVideo => "Create video",
        }
    }

    /// The step the workflow must sit on for this stage to be armed.
    pub fn required_step(self) -> Step {
        match self {
            Stage::SplitScript | Stage::GeneratePrompts => Step::Script,
            Stage::GenerateImages => Step::Prompts,
            Stage::GenerateAudio => Step::Images,
            Stage::CreateVideo => Step::Audio,
        }
    }

    /// The step reached on success. Splitting has none of its own: it only
    /// feeds prompt generation.
    pub fn landing_step(self) -> Option<Step> {
        match self {
            Stage::SplitScript => None,
            Stage::GeneratePrompts => Some(Step::Prompts),
            Stage::GenerateImages => Some(Step::Images),
            Stage::GenerateAudio => Some(Step::Audio),
            Stage::CreateVideo => Some(Step::Video),
        }
    }

    pub fn continuation(self) -> Continuation {
        match self {
            Stage::SplitScript => Continuation::Chain(Stage::GeneratePrompts),
            Stage::GeneratePrompts => Continuation::AwaitUser(Stage::GenerateImages),
            Stage::GenerateImages => Continuation::AwaitUser(Stage::GenerateAudio),
            Stage::GenerateAudio => Continuation::AwaitUser(Stage::CreateVideo),
            Stage::CreateVideo => Continuation::Done,
        }
    }

    /// The stage the user triggers after this one, skipping over stages
    /// that run chained.
    pub fn next_user_stage(self) -> Option<Stage> {
        match self.continuation() {
            Continuation::Chain(chained) => chained.next_user_stage(),
            Continuation::AwaitUser(next) => Some(next),
            Continuation::Done => None,
        }
    }

    pub fn error_prefix(self) -> &'static str {
        match self {
            Stage::SplitScript => "Error splitting script",
            Stage::GeneratePrompts => "Error generating prompts",
            Stage::GenerateImages => "Error generating images",
            Stage::GenerateAudio => "Error generating audio",
            Stage::CreateVideo => "Error creating video",
        }
    }

    /// Used when the backend reports a failure without an error string.
    pub fn fallback_error(self) -> &'static str {
        match self {
            Stage::SplitScript => "Failed to split script",
            Stage::GeneratePrompts => "Failed to generate prompts",
            Stage::GenerateImages => "Failed to generate images",
            Stage::GenerateAudio => "Failed to generate audio",
            Stage::CreateVideo => "Failed to create video",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
