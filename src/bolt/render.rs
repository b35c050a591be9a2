use super::files::{ExcludeList, FileMap};

/// Artifact id used for every file bundle the server writes.
pub const ARTIFACT_ID: &str = "project-files";

/// Title of the artifact carrying the full initial file set.
pub const CURRENT_FILE_TITLE: &str = "the current file";

/// Title of the artifact carrying only files changed since the last send.
pub const MODIFIED_FILES_TITLE: &str = "Currently modified files";

pub fn render_file_action(path: &str, content: &str) -> String {
    format!(
        "<boltAction type=\"file\" filePath=\"{}\">\n{}\n</boltAction>",
        path, content
    )
}

/// Render every non-excluded file as an action, separated by blank lines.
pub fn render_file_actions(files: &FileMap, exclude: &ExcludeList) -> String {
    files
        .iter()
        .filter(|(path, _)| !exclude.is_excluded(path))
        .map(|(path, content)| render_file_action(path, content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn wrap_artifact(id: &str, title: &str, body: &str) -> String {
    format!(
        "<boltArtifact id=\"{}\" title=\"{}\">\n{}\n</boltArtifact>",
        id, title, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::extract_files;

    #[test]
    fn renders_blank_line_separated_actions() {
        let files: FileMap = [("a.txt", "hello"), ("b.txt", "world")].into_iter().collect();
        let out = render_file_actions(&files, &ExcludeList::empty());
        assert_eq!(
            out,
            "<boltAction type=\"file\" filePath=\"a.txt\">\nhello\n</boltAction>\n\n<boltAction type=\"file\" filePath=\"b.txt\">\nworld\n</boltAction>"
        );
    }

    #[test]
    fn excluded_files_are_not_rendered() {
        let files: FileMap = [("components/weicon/index.js", "x"), ("app.js", "y")]
            .into_iter()
            .collect();
        let out = render_file_actions(&files, &ExcludeList::with_defaults());
        assert!(!out.contains("weicon"));
        assert!(out.contains("app.js"));
    }

    #[test]
    fn extraction_is_idempotent_through_rendering() {
        let text = "intro\n<boltAction type=\"file\" filePath=\"src/main.rs\">\n  fn main() {}\n</boltAction>\n<boltAction type=\"file\" filePath=\"README.md\"># Hi</boltAction>";
        let none = ExcludeList::empty();
        let first = extract_files(text, &none);
        let rendered = wrap_artifact(ARTIFACT_ID, CURRENT_FILE_TITLE, &render_file_actions(&first, &none));
        assert_eq!(extract_files(&rendered, &none), first);
    }
}
