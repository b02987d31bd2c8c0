//! Static task-profile table — task name to preferred capability tags.

/// Preferred capabilities for one task kind.
#[derive(Clone, Debug)]
pub struct TaskProfile {
    pub name: &'static str,
    pub preferred_tags: &'static [&'static str],
}

/// All known task profiles.
///
/// `command_routing` is the profile the dispatcher uses for its own routing
/// calls; the rest are available to callers that know what they need.
pub static TASK_PROFILES: &[TaskProfile] = &[
    TaskProfile {
        name: "simple_chat",
        preferred_tags: &["fast", "chat", "efficient"],
    },
    TaskProfile {
        name: "command_routing",
        preferred_tags: &["fast", "chat", "efficient"],
    },
    TaskProfile {
        name: "complex_reasoning",
        preferred_tags: &["powerful", "complex-reasoning", "large-context"],
    },
    TaskProfile {
        name: "document_summarization",
        preferred_tags: &["large-context", "powerful"],
    },
    TaskProfile {
        name: "code_generation",
        preferred_tags: &["strong-coding", "powerful"],
    },
    TaskProfile {
        name: "creative_writing",
        preferred_tags: &["powerful", "creative"],
    },
    TaskProfile {
        name: "local_fast_task",
        preferred_tags: &["local", "fast", "offline-capable"],
    },
];

/// Look up a profile by task name.
pub fn find_profile(name: &str) -> Option<&'static TaskProfile> {
    TASK_PROFILES.iter().find(|p| p.name == name)
}
