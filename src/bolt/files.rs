use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Path → content map with last-write-wins semantics.
///
/// Iteration follows the order in which each path was first inserted; that
/// order is for display only and does not take part in equality.
#[derive(Debug, Clone, Default)]
pub struct FileMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl FileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a file, returning the previous content.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) -> Option<String> {
        let path = path.into();
        let content = content.into();
        match self.index.get(&path) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, content)),
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, content));
                None
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.index.get(path).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        let i = self.index.remove(path)?;
        let (_, content) = self.entries.remove(i);
        for (_, idx) in self.index.iter_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(content)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    /// Merge `other` into `self`; entries from `other` win.
    pub fn extend(&mut self, other: FileMap) {
        for (path, content) in other.entries {
            self.insert(path, content);
        }
    }
}

impl PartialEq for FileMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(p, c)| other.get(p) == Some(c))
    }
}

impl Eq for FileMap {}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for FileMap {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut map = FileMap::new();
        for (p, c) in iter {
            map.insert(p, c);
        }
        map
    }
}

impl Serialize for FileMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (path, content) in self.iter() {
            map.serialize_entry(path, content)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FileMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FileMapVisitor;

        impl<'de> Visitor<'de> for FileMapVisitor {
            type Value = FileMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of file paths to contents")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FileMap, A::Error> {
                let mut map = FileMap::new();
                while let Some((path, content)) = access.next_entry::<String, String>()? {
                    map.insert(path, content);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(FileMapVisitor)
    }
}

/// Icon bundle files injected by the client runtime; never round-tripped
/// through the model.
pub const DEFAULT_EXCLUDED_FILES: &[&str] = &[
    "components/weicon/base64.js",
    "components/weicon/icon.css",
    "components/weicon/index.js",
    "components/weicon/index.json",
    "components/weicon/index.wxml",
    "components/weicon/icondata.js",
    "components/weicon/index.css",
    "/miniprogram/components/weicon/base64.js",
    "/miniprogram/components/weicon/icon.css",
    "/miniprogram/components/weicon/index.js",
    "/miniprogram/components/weicon/index.json",
    "/miniprogram/components/weicon/index.wxml",
    "/miniprogram/components/weicon/icondata.js",
    "/miniprogram/components/weicon/index.css",
];

/// Paths that are always ignored when extracting or rendering actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeList {
    paths: HashSet<String>,
}

impl ExcludeList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        DEFAULT_EXCLUDED_FILES.iter().copied().collect()
    }

    pub fn add(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExcludeList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_and_keeps_first_position() {
        let mut map = FileMap::new();
        map.insert("a.txt", "1");
        map.insert("b.txt", "2");
        assert_eq!(map.insert("a.txt", "3"), Some("1".to_string()));

        assert_eq!(map.get("a.txt"), Some("3"));
        assert_eq!(map.paths().collect::<Vec<_>>(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn equality_ignores_order() {
        let a: FileMap = [("x", "1"), ("y", "2")].into_iter().collect();
        let b: FileMap = [("y", "2"), ("x", "1")].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn remove_reindexes() {
        let mut map: FileMap = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        assert_eq!(map.remove("a"), Some("1".to_string()));
        assert_eq!(map.get("c"), Some("3"));
        map.insert("c", "4");
        assert_eq!(map.paths().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn serde_preserves_insertion_order() {
        let map: FileMap = serde_json::from_str(r#"{"z.js":"1","a.js":"2"}"#).unwrap();
        assert_eq!(map.paths().collect::<Vec<_>>(), vec!["z.js", "a.js"]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z.js":"1","a.js":"2"}"#);
    }

    #[test]
    fn default_excludes_cover_icon_bundle() {
        let excludes = ExcludeList::with_defaults();
        assert!(excludes.is_excluded("components/weicon/index.js"));
        assert!(!excludes.is_excluded("src/index.js"));
        assert_eq!(excludes.len(), DEFAULT_EXCLUDED_FILES.len());
    }
}
