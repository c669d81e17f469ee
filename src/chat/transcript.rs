use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::chat::message::Message;

const TRANSCRIPT_EXTENSION: &str = "json";

/// Failure during transcript save or load.
///
/// Callers at the command layer report these and keep running.
#[derive(Debug)]
pub enum PersistenceError {
    Write { path: PathBuf, source: io::Error },
    Read { path: PathBuf, source: io::Error },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write { path, source } => {
                write!(f, "failed to write transcript '{}': {source}", path.display())
            }
            Self::Read { path, source } => {
                write!(f, "failed to read transcript '{}': {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse transcript '{}': {source}", path.display())
            }
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write { source, .. } | Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Ordered conversation history.
///
/// Insertion order is significant: the sequence is sent to the
/// completion service verbatim. Mutation is append or wholesale replace
/// only.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Writes the messages as pretty-printed JSON and returns the path
    /// actually written (a missing `.json` extension is appended).
    pub fn save(&self, path: &str) -> Result<PathBuf, PersistenceError> {
        let path = normalize_path(path);
        let body =
            serde_json::to_string_pretty(&self.messages).map_err(|source| PersistenceError::Parse {
                path: path.clone(),
                source,
            })?;
        fs::write(&path, body).map_err(|source| PersistenceError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Reads a saved transcript and replaces the current messages in one
    /// step. Same extension normalization as [`Transcript::save`].
    pub fn load(&mut self, path: &str) -> Result<PathBuf, PersistenceError> {
        let path = normalize_path(path);
        let raw = fs::read_to_string(&path).map_err(|source| PersistenceError::Read {
            path: path.clone(),
            source,
        })?;
        let messages: Vec<Message> =
            serde_json::from_str(&raw).map_err(|source| PersistenceError::Parse {
                path: path.clone(),
                source,
            })?;
        self.messages = messages;
        Ok(path)
    }
}

fn normalize_path(path: &str) -> PathBuf {
    let path = Path::new(path);
    match path.extension() {
        Some(ext) if ext == TRANSCRIPT_EXTENSION => path.to_path_buf(),
        _ => {
            let mut normalized = path.as_os_str().to_os_string();
            normalized.push(".");
            normalized.push(TRANSCRIPT_EXTENSION);
            PathBuf::from(normalized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::{Role, ToolCallRequest};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_path(label: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("parley-test-{label}-{nanos}"))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn missing_extension_is_appended() {
        assert_eq!(normalize_path("mylog"), PathBuf::from("mylog.json"));
        assert_eq!(normalize_path("mylog.json"), PathBuf::from("mylog.json"));
        assert_eq!(normalize_path("dir/my.log"), PathBuf::from("dir/my.log.json"));
    }

    #[test]
    fn save_and_load_round_trip_exactly() {
        let mut transcript = Transcript::new();
        transcript.push(Message::text(Role::System, "be brief"));
        transcript.push(Message::text(Role::User, "2+2?"));
        transcript.push(Message::tool_request(ToolCallRequest::new(
            "c1",
            "think",
            r#"{"thought":"sums"}"#,
        )));
        transcript.push(Message::tool_result("c1", "sums"));
        transcript.push(Message::text(Role::Assistant, "4"));

        let path = unique_temp_path("roundtrip");
        let written = transcript.save(&path).unwrap();

        let mut restored = Transcript::new();
        restored.load(&path).unwrap();
        assert_eq!(restored, transcript);

        fs::remove_file(written).ok();
    }

    #[test]
    fn bare_and_suffixed_paths_write_the_same_file() {
        let mut transcript = Transcript::new();
        transcript.push(Message::text(Role::User, "hi"));

        let bare = unique_temp_path("suffix");
        let written_bare = transcript.save(&bare).unwrap();
        let first = fs::read(&written_bare).unwrap();

        let written_suffixed = transcript.save(&format!("{bare}.json")).unwrap();
        assert_eq!(written_bare, written_suffixed);
        assert_eq!(fs::read(&written_suffixed).unwrap(), first);

        fs::remove_file(written_bare).ok();
    }

    #[test]
    fn load_replaces_instead_of_merging() {
        let mut on_disk = Transcript::new();
        on_disk.push(Message::text(Role::User, "saved"));
        let path = unique_temp_path("replace");
        let written = on_disk.save(&path).unwrap();

        let mut transcript = Transcript::new();
        transcript.push(Message::text(Role::User, "stale"));
        transcript.push(Message::text(Role::Assistant, "stale too"));
        transcript.load(&path).unwrap();

        assert_eq!(transcript.messages(), on_disk.messages());

        fs::remove_file(written).ok();
    }

    #[test]
    fn load_missing_file_reports_read_error() {
        let mut transcript = Transcript::new();
        let err = transcript.load(&unique_temp_path("missing")).unwrap_err();
        assert!(matches!(err, PersistenceError::Read { .. }));
    }

    #[test]
    fn load_garbage_reports_parse_error() {
        let path = unique_temp_path("garbage");
        let normalized = format!("{path}.json");
        fs::write(&normalized, "not json").unwrap();

        let mut transcript = Transcript::new();
        let err = transcript.load(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::Parse { .. }));

        fs::remove_file(normalized).ok();
    }
}
