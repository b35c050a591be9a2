//! Prompt assembly: turns a [`ProjectModel`] into the text sent to the
//! code-generating model.
//!
//! Everything here is pure and deterministic. The same project always
//! renders to the same bytes, and missing data degrades to fallback text.

pub mod builder;
pub mod database;
pub mod docker;
pub mod sections;
pub mod templates;

pub use builder::{builder_system_prompt, chat_system_prompt, OtherConfig};
pub use database::database_directives;
pub use docker::docker_section;
pub use templates::{render, select_template, TemplateKind};

use crate::project::{ChatType, ProjectModel};

/// Full generation prompt for a project's main chat.
pub fn generate_prompt(project: &ProjectModel) -> String {
    generate_chat_prompt(project, ChatType::Application)
}

/// Generation prompt for one of a project's chats, with Docker instructions.
pub fn generate_chat_prompt(project: &ProjectModel, chat_type: ChatType) -> String {
    let kind = select_template(project.landing_page_config(), chat_type);
    tracing::debug!(
        project = %project.name,
        template = kind.as_str(),
        "Rendering generation prompt"
    );

    let mut prompt = render(kind, project);
    prompt.push_str(&docker_section(project));
    prompt
}
