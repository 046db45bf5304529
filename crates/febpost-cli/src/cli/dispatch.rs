use febpost_core::domain::PostStage;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub(super) struct StageCommandSpec {
    pub(super) command: &'static str,
    pub(super) stage: PostStage,
}

pub(super) const STAGE_COMMANDS: [StageCommandSpec; 6] = [
    StageCommandSpec {
        command: "extract",
        stage: PostStage::Extract,
    },
    StageCommandSpec {
        command: "force",
        stage: PostStage::ForceMagnitude,
    },
    StageCommandSpec {
        command: "displacement",
        stage: PostStage::Displacement,
    },
    StageCommandSpec {
        command: "work",
        stage: PostStage::Work,
    },
    StageCommandSpec {
        command: "hysteresis",
        stage: PostStage::Hysteresis,
    },
    StageCommandSpec {
        command: "max-period",
        stage: PostStage::PeakPeriod,
    },
];

/// Stage order the `chain` command replays against one report.
pub(super) const CHAIN_ORDER: [PostStage; 4] = [
    PostStage::Extract,
    PostStage::Displacement,
    PostStage::ForceMagnitude,
    PostStage::Work,
];

pub(super) fn stage_command_spec(command: &str) -> Option<StageCommandSpec> {
    STAGE_COMMANDS
        .iter()
        .copied()
        .find(|spec| spec.command == command)
}

pub(super) fn command_for_stage(stage: PostStage) -> Option<StageCommandSpec> {
    STAGE_COMMANDS
        .iter()
        .copied()
        .find(|spec| spec.stage == stage)
}

/// Dispatch by executable name, so a `febpost-extract` hard link behaves like
/// `febpost extract`.
pub(super) fn command_alias_from_program_name(program_name: &str) -> Option<&'static str> {
    let executable_name = Path::new(program_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(program_name);
    let normalized = executable_name
        .strip_suffix(".exe")
        .unwrap_or(executable_name);

    if normalized == "febpost" {
        return None;
    }

    let command_name = normalized.strip_prefix("febpost-").unwrap_or(normalized);
    stage_command_spec(command_name).map(|spec| spec.command)
}

#[cfg(test)]
mod tests {
    use super::{
        CHAIN_ORDER, command_alias_from_program_name, command_for_stage, stage_command_spec,
    };
    use febpost_core::domain::PostStage;

    #[test]
    fn every_chain_stage_has_a_registered_command() {
        for stage in CHAIN_ORDER {
            assert!(
                command_for_stage(stage).is_some(),
                "stage {stage} should be registered"
            );
        }
    }

    #[test]
    fn program_name_aliases_resolve_stage_commands() {
        assert_eq!(command_alias_from_program_name("febpost"), None);
        assert_eq!(
            command_alias_from_program_name("/usr/bin/febpost-extract"),
            Some("extract")
        );
        assert_eq!(
            command_alias_from_program_name("hysteresis.exe"),
            Some("hysteresis")
        );
        assert_eq!(command_alias_from_program_name("unrelated"), None);
    }

    #[test]
    fn command_lookup_round_trips_stage_names() {
        let spec = stage_command_spec("max-period").expect("command should be registered");
        assert_eq!(spec.stage, PostStage::PeakPeriod);
    }
}
