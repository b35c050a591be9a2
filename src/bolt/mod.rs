//! The bolt action wire format.
//!
//! Model output and replayed file contents travel as pseudo-XML:
//! `<boltArtifact id=".." title="..">` wrapping one or more
//! `<boltAction type="file" filePath="..">CONTENT</boltAction>` blocks.

mod files;
mod parser;
mod render;
mod stream;

pub use files::{ExcludeList, FileMap, DEFAULT_EXCLUDED_FILES};
pub use parser::{parse_open_tag, parse_segments, ActionTag, MessageSegment};
pub use render::{
    render_file_action, render_file_actions, wrap_artifact, ARTIFACT_ID, CURRENT_FILE_TITLE,
    MODIFIED_FILES_TITLE,
};
pub use stream::{CompletedFile, PartialFile, StreamParser};

/// Fold parsed segments into a file map, skipping excluded paths.
pub fn files_from_segments<'a, I>(segments: I, exclude: &ExcludeList) -> FileMap
where
    I: IntoIterator<Item = &'a MessageSegment>,
{
    let mut files = FileMap::new();
    for segment in segments {
        if let MessageSegment::FileAction { path, content } = segment {
            if !exclude.is_excluded(path) {
                files.insert(path.clone(), content.clone());
            }
        }
    }
    files
}

/// Extract every file action in `text`. Malformed input yields fewer
/// files, never an error.
pub fn extract_files(text: &str, exclude: &ExcludeList) -> FileMap {
    files_from_segments(&parse_segments(text), exclude)
}

/// Content of the first action writing `path`, if any.
pub fn parse_file_from_context(path: &str, text: &str) -> Option<String> {
    parse_segments(text).into_iter().find_map(|segment| match segment {
        MessageSegment::FileAction { path: p, content } if p == path => Some(content),
        _ => None,
    })
}
