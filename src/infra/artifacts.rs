// ============================================================
// Layer 6 — Artifact Paths
// ============================================================
// The mobile app loads two files from fixed locations under
// the project root:
//
//   <root>/assets/models/vocab.txt
//   <root>/assets/models/scam_detector.tflite

use std::path::PathBuf;

pub const MODELS_DIR: &str      = "assets/models";
pub const VOCAB_FILE: &str      = "vocab.txt";
pub const MODEL_FILE: &str      = "scam_detector.tflite";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    root: PathBuf,
}

impl ArtifactPaths {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self { root: project_root.into() }
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join(MODELS_DIR)
    }

    pub fn vocab_file(&self) -> PathBuf {
        self.models_dir().join(VOCAB_FILE)
    }

    pub fn model_file(&self) -> PathBuf {
        self.models_dir().join(MODEL_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_locations() {
        let paths = ArtifactPaths::new("/app");
        assert_eq!(paths.vocab_file(), PathBuf::from("/app/assets/models/vocab.txt"));
        assert_eq!(paths.model_file(), PathBuf::from("/app/assets/models/scam_detector.tflite"));
    }

    #[test]
    fn test_relative_root() {
        let paths = ArtifactPaths::new(".");
        assert!(paths.model_file().ends_with("assets/models/scam_detector.tflite"));
    }
}
