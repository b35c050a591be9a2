use std::io::{Cursor, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::bolt::FileMap;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to write zip entry {path}: {source}")]
    Entry {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("No zip files were generated")]
    Empty,
}

/// One file to place in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    pub path: String,
    pub content: Vec<u8>,
}

impl ZipEntry {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Generated code for an app: each side is a directory tree where string
/// values are files and objects are folders. Flat `path → content` maps are
/// a tree of depth one and work unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedAppCode {
    #[serde(default)]
    pub frontend: Option<Value>,
    #[serde(default)]
    pub backend: Option<Value>,
}

impl GeneratedAppCode {
    pub fn from_file_maps(frontend: Option<&FileMap>, backend: Option<&FileMap>) -> Self {
        let to_value = |files: &FileMap| {
            Value::Object(
                files
                    .iter()
                    .map(|(p, c)| (p.to_string(), Value::String(c.to_string())))
                    .collect(),
            )
        };
        Self {
            frontend: frontend.map(to_value),
            backend: backend.map(to_value),
        }
    }
}

/// Zipped frontend and backend bundles.
#[derive(Debug, Clone, Default)]
pub struct AppZips {
    pub frontend: Option<Vec<u8>>,
    pub backend: Option<Vec<u8>>,
}

impl AppZips {
    pub fn is_empty(&self) -> bool {
        self.frontend.is_none() && self.backend.is_none()
    }
}

/// Deflate every entry into an in-memory zip.
pub fn create_zip_from_files(files: &[ZipEntry], zip_name: &str) -> Result<Vec<u8>, ArchiveError> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(9));

        for file in files {
            zip.start_file(file.path.as_str(), options)?;
            zip.write_all(&file.content).map_err(|source| ArchiveError::Entry {
                path: file.path.clone(),
                source,
            })?;
        }

        zip.finish()?;
    }

    let bytes = cursor.into_inner();
    tracing::debug!(zip_name, size = bytes.len(), entries = files.len(), "Zip file created");
    Ok(bytes)
}

/// Flatten a directory tree into entries rooted at `base_path`.
pub fn flatten_directory_structure(tree: &Value, base_path: &str) -> Vec<ZipEntry> {
    let mut entries = Vec::new();
    if let Value::Object(map) = tree {
        traverse(map, base_path, &mut entries);
    }
    entries
}

fn traverse(map: &Map<String, Value>, current: &str, out: &mut Vec<ZipEntry>) {
    for (key, value) in map {
        let full_path = if current.is_empty() {
            key.clone()
        } else {
            format!("{}/{}", current, key)
        };
        match value {
            Value::String(content) => out.push(ZipEntry::new(full_path, content.as_bytes())),
            Value::Object(children) => traverse(children, &full_path, out),
            _ => {}
        }
    }
}

pub fn create_zip_from_directory_structure(tree: &Value, base_path: &str) -> Result<Vec<u8>, ArchiveError> {
    let entries = flatten_directory_structure(tree, base_path);
    let name = if base_path.is_empty() { "archive" } else { base_path };
    create_zip_from_files(&entries, &format!("{}.zip", name))
}

/// Nest flat entries into a directory tree.
pub fn create_directory_structure_from_files(files: &[ZipEntry]) -> Value {
    let mut root = Map::new();
    for file in files {
        let parts: Vec<&str> = file.path.split('/').collect();
        let Some((name, dirs)) = parts.split_last() else {
            continue;
        };
        let mut current = &mut root;
        for dir in dirs {
            let entry = current
                .entry(dir.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(children) => children,
                _ => unreachable!("entry was just made an object"),
            };
        }
        current.insert(
            name.to_string(),
            Value::String(String::from_utf8_lossy(&file.content).into_owned()),
        );
    }
    Value::Object(root)
}

/// Build separate frontend and backend zips rooted at `frontend/` and
/// `backend/`.
pub fn create_generated_app_zips(code: &GeneratedAppCode) -> Result<AppZips, ArchiveError> {
    let mut zips = AppZips::default();
    if let Some(frontend) = &code.frontend {
        tracing::info!("Creating frontend zip file");
        zips.frontend = Some(create_zip_from_directory_structure(frontend, "frontend")?);
    }
    if let Some(backend) = &code.backend {
        tracing::info!("Creating backend zip file");
        zips.backend = Some(create_zip_from_directory_structure(backend, "backend")?);
    }
    Ok(zips)
}
