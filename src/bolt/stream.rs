use serde::Serialize;

use super::files::{ExcludeList, FileMap};
use super::parser::{parse_open_tag, scan_body, ActionTag, BodyEnd, ACTION_CLOSE, ACTION_OPEN};

/// A file action whose close tag has arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedFile {
    pub path: String,
    pub content: String,
}

/// The file currently being written by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartialFile<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

/// Incremental extractor for streamed model output.
///
/// Chunks may split tags anywhere. Only the unconsumed tail is buffered:
/// text outside actions is dropped once it can no longer start a tag.
#[derive(Debug)]
pub struct StreamParser {
    buffer: String,
    current: Option<ActionTag>,
    exclude: ExcludeList,
    files: FileMap,
}

impl StreamParser {
    pub fn new(exclude: ExcludeList) -> Self {
        Self {
            buffer: String::new(),
            current: None,
            exclude,
            files: FileMap::new(),
        }
    }

    /// Feed a chunk, returning every file action completed by it.
    pub fn push(&mut self, chunk: &str) -> Vec<CompletedFile> {
        self.buffer.push_str(chunk);
        let mut completed = Vec::new();

        loop {
            match self.current.take() {
                None => match self.buffer.find(ACTION_OPEN) {
                    Some(at) => {
                        self.buffer.drain(..at);
                        let Some((tag, len)) = parse_open_tag(&self.buffer) else {
                            break;
                        };
                        self.buffer.drain(..len);
                        self.current = Some(tag);
                    }
                    None => {
                        let keep_from = partial_marker_start(&self.buffer);
                        self.buffer.drain(..keep_from);
                        break;
                    }
                },
                Some(tag) => match scan_body(&self.buffer) {
                    BodyEnd::Closed(close) => {
                        let content = self.buffer[..close].trim().to_string();
                        self.buffer.drain(..close + ACTION_CLOSE.len());
                        if let Some(path) = tag.file_path() {
                            if !self.exclude.is_excluded(path) {
                                self.files.insert(path, content.clone());
                                completed.push(CompletedFile {
                                    path: path.to_string(),
                                    content,
                                });
                            }
                        }
                    }
                    BodyEnd::Nested(at) => {
                        tracing::debug!(path = ?tag.get("filePath"), "Dropping action with nested opening tag");
                        self.buffer.drain(..at);
                    }
                    BodyEnd::Open => {
                        self.current = Some(tag);
                        break;
                    }
                },
            }
        }

        completed
    }

    /// The file action still open, if it is a file write.
    pub fn partial(&self) -> Option<PartialFile<'_>> {
        let path = self.current.as_ref()?.file_path()?;
        Some(PartialFile {
            path,
            content: self.buffer.trim_start(),
        })
    }

    /// Files completed so far.
    pub fn files(&self) -> &FileMap {
        &self.files
    }

    /// End of stream. An action still open is discarded.
    pub fn finish(self) -> FileMap {
        if let Some(partial) = self.partial() {
            tracing::debug!(path = partial.path, "Discarding unterminated action at end of stream");
        }
        self.files
    }
}

/// Byte offset of the shortest suffix that could still grow into an
/// opening tag, or the buffer length when none can.
fn partial_marker_start(buffer: &str) -> usize {
    let min = buffer.len().saturating_sub(ACTION_OPEN.len() - 1);
    (min..buffer.len())
        .filter(|&i| buffer.is_char_boundary(i))
        .find(|&i| ACTION_OPEN.starts_with(&buffer[i..]))
        .unwrap_or(buffer.len())
}
