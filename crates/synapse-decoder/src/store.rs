//! Session state persistence behind storage contracts
//!
//! The pipeline depends on load/save contracts, not file paths. The
//! default implementation keeps labels, the sampling rate and the
//! fitted models as JSON documents, the prediction history as an
//! append-only text log, and recorded examples as one file per window
//! under a directory per class.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use synapse_core::{
    CaptureOutcome, LabelSet, SynapseError, SynapseResult, Window, DEFAULT_RATE_HZ,
};
use tracing::warn;

use crate::classifier::TrainedModels;

const LABELS_FILE: &str = "labels.json";
const RATE_FILE: &str = "sampling_rate.json";
const MODELS_FILE: &str = "models.json";
const HISTORY_FILE: &str = "history.log";

/// Persistence contract for session state
pub trait StateStore {
    /// Persist the label mapping for later prediction runs
    fn save_labels(&self, labels: &LabelSet) -> SynapseResult<()>;

    /// Load the label mapping; empty when nothing was ever trained
    fn load_labels(&self) -> SynapseResult<LabelSet>;

    /// Persist the calibrated sampling rate
    fn save_rate(&self, rate_hz: u32) -> SynapseResult<()>;

    /// Load the calibrated sampling rate, defaulting when absent
    fn load_rate(&self) -> SynapseResult<u32>;

    /// Persist both fitted classifier variants
    fn save_models(&self, models: &TrainedModels) -> SynapseResult<()>;

    /// Load the fitted models; `None` when nothing was ever trained
    fn load_models(&self) -> SynapseResult<Option<TrainedModels>>;

    /// Append one predicted label to the history log
    fn append_history(&self, label: &str) -> SynapseResult<()>;

    /// Reset the history log to empty
    fn clear_history(&self) -> SynapseResult<()>;
}

/// JSON-file implementation of the state store
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    root: PathBuf,
}

impl JsonStateStore {
    /// Store rooted at a directory, created if missing
    pub fn open(root: impl Into<PathBuf>) -> SynapseResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| SynapseError::storage(format!("create {}", root.display()), e))?;
        Ok(JsonStateStore { root })
    }

    fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn write_json<T: serde::Serialize>(&self, file: &str, value: &T) -> SynapseResult<()> {
        let text = serde_json::to_string_pretty(value).map_err(|e| SynapseError::Storage {
            context: format!("serialize {file}: {e}"),
            source: None,
        })?;
        fs::write(self.path(file), text)
            .map_err(|e| SynapseError::storage(format!("write {file}"), e))
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, file: &str) -> SynapseResult<Option<T>> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| SynapseError::storage(format!("read {file}"), e))?;
        let value = serde_json::from_str(&text).map_err(|e| SynapseError::Storage {
            context: format!("parse {file}: {e}"),
            source: None,
        })?;
        Ok(Some(value))
    }
}

impl StateStore for JsonStateStore {
    fn save_labels(&self, labels: &LabelSet) -> SynapseResult<()> {
        self.write_json(LABELS_FILE, labels)
    }

    fn load_labels(&self) -> SynapseResult<LabelSet> {
        Ok(self.read_json(LABELS_FILE)?.unwrap_or_default())
    }

    fn save_rate(&self, rate_hz: u32) -> SynapseResult<()> {
        self.write_json(RATE_FILE, &rate_hz)
    }

    fn load_rate(&self) -> SynapseResult<u32> {
        Ok(self.read_json(RATE_FILE)?.unwrap_or(DEFAULT_RATE_HZ))
    }

    fn save_models(&self, models: &TrainedModels) -> SynapseResult<()> {
        self.write_json(MODELS_FILE, models)
    }

    fn load_models(&self) -> SynapseResult<Option<TrainedModels>> {
        self.read_json(MODELS_FILE)
    }

    fn append_history(&self, label: &str) -> SynapseResult<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(HISTORY_FILE))
            .map_err(|e| SynapseError::storage("open history log", e))?;
        writeln!(file, "{label}").map_err(|e| SynapseError::storage("append history log", e))
    }

    fn clear_history(&self) -> SynapseResult<()> {
        fs::write(self.path(HISTORY_FILE), "")
            .map_err(|e| SynapseError::storage("clear history log", e))
    }
}

/// A labeled training set read back from example storage
#[derive(Debug)]
pub struct TrainingSet {
    pub labels: LabelSet,
    /// Windows paired with their class index into `labels`
    pub examples: Vec<(Window, usize)>,
}

/// Per-class example storage: a directory per label, one window per
/// file, one sample per line under a `signal` header
#[derive(Debug, Clone)]
pub struct ExampleStore {
    root: PathBuf,
}

impl ExampleStore {
    /// Store rooted at a directory, created if missing
    pub fn open(root: impl Into<PathBuf>) -> SynapseResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| SynapseError::storage(format!("create {}", root.display()), e))?;
        Ok(ExampleStore { root })
    }

    /// Save one captured window under its class directory
    pub fn save_example(&self, label: &str, window: &Window) -> SynapseResult<PathBuf> {
        let dir = self.root.join(label);
        fs::create_dir_all(&dir)
            .map_err(|e| SynapseError::storage(format!("create class dir {label}"), e))?;

        let index = next_free_index(&dir)?;
        let path = dir.join(format!("{label}_{index:04}.csv"));

        let mut body = String::with_capacity(window.len() * 4 + 8);
        body.push_str("signal\n");
        for sample in window.samples() {
            body.push_str(&sample.to_string());
            body.push('\n');
        }
        fs::write(&path, body)
            .map_err(|e| SynapseError::storage(format!("write {}", path.display()), e))?;
        Ok(path)
    }

    /// Read every stored example back, sorted by class name. Class
    /// identity comes from the parent directory name. Files that do not
    /// parse or fall below the completeness threshold are skipped with
    /// a warning; a bad file never poisons a training run.
    pub fn load_training_set(&self, rate_hz: u32, expected: usize) -> SynapseResult<TrainingSet> {
        let mut class_names: Vec<String> = fs::read_dir(&self.root)
            .map_err(|e| SynapseError::storage("list example store", e))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        class_names.sort();

        let labels = LabelSet::new(class_names.iter().cloned());
        let mut examples = Vec::new();

        for (class_index, name) in class_names.iter().enumerate() {
            let dir = self.root.join(name);
            let mut files: Vec<PathBuf> = fs::read_dir(&dir)
                .map_err(|e| SynapseError::storage(format!("list class dir {name}"), e))?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect();
            files.sort();

            for path in files {
                match read_example(&path, rate_hz, expected) {
                    Ok(Some(window)) => examples.push((window, class_index)),
                    Ok(None) => {
                        warn!(file = %path.display(), "skipping incomplete example");
                    }
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "skipping unreadable example");
                    }
                }
            }
        }

        Ok(TrainingSet { labels, examples })
    }
}

/// One past the highest index among existing example files, so a save
/// never reuses the slot of a deleted earlier recording
fn next_free_index(dir: &Path) -> SynapseResult<usize> {
    let mut next = 0usize;
    for entry in fs::read_dir(dir)
        .map_err(|e| SynapseError::storage(format!("list class dir {}", dir.display()), e))?
    {
        let Ok(entry) = entry else { continue };
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(stem) = name.strip_suffix(".csv") else {
            continue;
        };
        if let Some(Ok(index)) = stem.rsplit('_').next().map(str::parse::<usize>) {
            next = next.max(index + 1);
        }
    }
    Ok(next)
}

/// Parse one example file into a window, `None` when it is too short
fn read_example(path: &Path, rate_hz: u32, expected: usize) -> SynapseResult<Option<Window>> {
    let text = fs::read_to_string(path)
        .map_err(|e| SynapseError::storage(format!("read {}", path.display()), e))?;

    let mut samples = Vec::with_capacity(expected);
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line == "signal" {
            continue;
        }
        let value: i64 = line.parse().map_err(|_| SynapseError::Storage {
            context: format!("parse sample '{line}' in {}", path.display()),
            source: None,
        })?;
        samples.push(value.clamp(0, 127) as u8);
    }

    match Window::from_samples(samples, rate_hz, expected) {
        CaptureOutcome::Complete(window) => Ok(Some(window)),
        CaptureOutcome::Incomplete { .. } => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synapse_core::WindowBuilder;

    fn window_of(count: usize, expected: usize) -> Window {
        let mut builder = WindowBuilder::new(250, expected);
        for i in 0..count {
            builder.push((i % 128) as u8);
        }
        match builder.finish() {
            CaptureOutcome::Complete(w) => w,
            outcome => panic!("test window incomplete: {outcome:?}"),
        }
    }

    #[test]
    fn test_labels_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::open(dir.path()).unwrap();

        assert!(store.load_labels().unwrap().is_empty());

        let labels = LabelSet::new(["left", "right"].map(String::from));
        store.save_labels(&labels).unwrap();
        assert_eq!(store.load_labels().unwrap(), labels);
    }

    #[test]
    fn test_rate_defaults_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::open(dir.path()).unwrap();
        assert_eq!(store.load_rate().unwrap(), DEFAULT_RATE_HZ);

        store.save_rate(512).unwrap();
        assert_eq!(store.load_rate().unwrap(), 512);
    }

    #[test]
    fn test_history_append_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::open(dir.path()).unwrap();

        store.append_history("a").unwrap();
        store.append_history("b").unwrap();
        let text = std::fs::read_to_string(dir.path().join(HISTORY_FILE)).unwrap();
        assert_eq!(text, "a\nb\n");

        store.clear_history().unwrap();
        let text = std::fs::read_to_string(dir.path().join(HISTORY_FILE)).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_examples_round_trip_by_class() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExampleStore::open(dir.path()).unwrap();

        store.save_example("beta", &window_of(100, 100)).unwrap();
        store.save_example("alpha", &window_of(100, 100)).unwrap();
        store.save_example("alpha", &window_of(100, 100)).unwrap();

        let set = store.load_training_set(250, 100).unwrap();
        // Classes come back sorted by name
        assert_eq!(set.labels.labels(), &["alpha", "beta"]);
        assert_eq!(set.examples.len(), 3);
        assert_eq!(set.examples.iter().filter(|(_, c)| *c == 0).count(), 2);
        assert_eq!(set.examples.iter().filter(|(_, c)| *c == 1).count(), 1);
        assert!(set.examples.iter().all(|(w, _)| w.len() == 100));
    }

    #[test]
    fn test_deleting_an_example_never_clobbers_later_saves() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExampleStore::open(dir.path()).unwrap();

        for _ in 0..3 {
            store.save_example("alpha", &window_of(100, 100)).unwrap();
        }
        std::fs::remove_file(dir.path().join("alpha").join("alpha_0000.csv")).unwrap();

        let path = store.save_example("alpha", &window_of(100, 100)).unwrap();
        assert_eq!(path.file_name().unwrap(), "alpha_0003.csv");

        let set = store.load_training_set(250, 100).unwrap();
        assert_eq!(set.examples.len(), 3);
    }

    #[test]
    fn test_short_example_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExampleStore::open(dir.path()).unwrap();

        let class_dir = dir.path().join("alpha");
        std::fs::create_dir_all(&class_dir).unwrap();
        // Only 10 of 100 expected samples
        let mut body = String::from("signal\n");
        for i in 0..10 {
            body.push_str(&format!("{i}\n"));
        }
        std::fs::write(class_dir.join("alpha_0000.csv"), body).unwrap();

        let set = store.load_training_set(250, 100).unwrap();
        assert_eq!(set.labels.len(), 1);
        assert!(set.examples.is_empty());
    }

    #[test]
    fn test_corrupt_example_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExampleStore::open(dir.path()).unwrap();
        store.save_example("alpha", &window_of(100, 100)).unwrap();

        let class_dir = dir.path().join("alpha");
        std::fs::write(class_dir.join("alpha_9999.csv"), "signal\nnot-a-number\n").unwrap();

        let set = store.load_training_set(250, 100).unwrap();
        assert_eq!(set.examples.len(), 1);
    }

    #[test]
    fn test_empty_store_yields_empty_training_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExampleStore::open(dir.path()).unwrap();
        let set = store.load_training_set(250, 100).unwrap();
        assert!(set.labels.is_empty());
        assert!(set.examples.is_empty());
    }
}
