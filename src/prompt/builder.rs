use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::database::database_directives;
use super::generate_chat_prompt;
use crate::project::{ChatType, ProjectModel};

/// Client-side generation switches sent as `otherConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherConfig {
    #[serde(default)]
    pub is_back_end: bool,
    #[serde(default)]
    pub backend_language: Option<String>,
    #[serde(default)]
    pub chat_type: Option<ChatType>,
    /// Any other keys, passed to the model verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

const BUILDER_INSTRUCTIONS: &str = r#"You are an expert full-stack engineer generating complete, runnable projects.

## Output Format
Return every file you create or change inside a single artifact:

<boltArtifact id="project-files" title="Short title">
<boltAction type="file" filePath="relative/path.ext">
full file content
</boltAction>
</boltArtifact>

- Always emit the FULL content of each file, never a diff or a placeholder
- Use paths relative to the project root
- Do not nest boltAction blocks
- Keep explanations outside the artifact short"#;

const CHAT_INSTRUCTIONS: &str = "You are a helpful senior software engineer. Answer questions about the user's project clearly and concisely. Do not emit boltArtifact or boltAction blocks in this mode.";

pub fn chat_system_prompt() -> String {
    CHAT_INSTRUCTIONS.to_string()
}

/// System prompt for builder mode: output format, project prompt and
/// stack-specific directives.
pub fn builder_system_prompt(project: Option<&ProjectModel>, config: &OtherConfig) -> String {
    let mut prompt = String::from(BUILDER_INSTRUCTIONS);

    if let Some(project) = project {
        let chat_type = config.chat_type.unwrap_or_default();
        prompt.push_str("\n\n");
        prompt.push_str(&generate_chat_prompt(project, chat_type));
    }

    if config.is_back_end {
        let language = config.backend_language.as_deref().unwrap_or("node");
        prompt.push_str(&format!(
            "\n\nIMPORTANT: Generate a backend in {} alongside the frontend, under a top-level `backend/` folder.",
            language
        ));
    }

    if !config.extra.is_empty() {
        let extra = serde_json::to_string_pretty(&config.extra).unwrap_or_default();
        prompt.push_str(&format!("\n\n## Additional Configuration\n```json\n{}\n```", extra));
    }

    if let Some(project) = project {
        let directives = database_directives(project);
        if !directives.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&directives.join("\n"));
        }
    }

    prompt
}
