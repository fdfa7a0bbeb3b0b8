//! Run descriptions for training experiments.
//!
//! A description template is a JSON file of the form
//! `{"description": "..."}`. The text may contain `{model_name}` and
//! `{data_version}` placeholders. The label list the run was trained on
//! is appended, and can be saved alongside as a JSON array.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors raised while building a run description.
#[derive(Debug, thiserror::Error)]
pub enum DescribeError {
    /// A file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template is not valid JSON or lacks a `description` string.
    #[error("invalid template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The label list could not be serialized.
    #[error("failed to serialize label list: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A parsed description template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunTemplate {
    /// Description text with `{model_name}` and `{data_version}`
    /// placeholders.
    pub description: String,
}

impl RunTemplate {
    /// Load a template from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`DescribeError::Io`] if the file cannot be read, or
    /// [`DescribeError::Template`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, DescribeError> {
        let json = std::fs::read_to_string(path).map_err(|source| DescribeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| DescribeError::Template {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fill in the placeholders and append the label list.
    ///
    /// Placeholders other than `{model_name}` and `{data_version}` are
    /// left as written. An empty label list appends nothing.
    #[must_use]
    pub fn render(&self, model_name: &str, data_version: &str, labels: &[String]) -> String {
        let mut text = self
            .description
            .replace("{model_name}", model_name)
            .replace("{data_version}", data_version);
        if !labels.is_empty() {
            text.push_str("\n\nLabels: ");
            text.push_str(&labels.join(", "));
        }
        text
    }
}

/// Build a run description from the template at `template_path`.
///
/// # Errors
///
/// See [`RunTemplate::load`].
pub fn describe_run(
    template_path: &Path,
    model_name: &str,
    data_version: &str,
    labels: &[String],
) -> Result<String, DescribeError> {
    Ok(RunTemplate::load(template_path)?.render(model_name, data_version, labels))
}

/// Save the label list as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns [`DescribeError::Io`] if the file cannot be written.
pub fn write_label_list(path: &Path, labels: &[String]) -> Result<(), DescribeError> {
    let json = serde_json::to_string_pretty(labels)?;
    std::fs::write(path, json).map_err(|source| DescribeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn render_fills_placeholders() {
        let t = RunTemplate {
            description: "Model {model_name} on data {data_version}.".to_owned(),
        };
        assert_eq!(
            t.render("cnn_meteorite_clf", "pre_release", &[]),
            "Model cnn_meteorite_clf on data pre_release."
        );
    }

    #[test]
    fn render_appends_labels() {
        let t = RunTemplate {
            description: "{model_name}".to_owned(),
        };
        let text = t.render("m", "v", &labels(&["H5", "L6", "CM2"]));
        assert_eq!(text, "m\n\nLabels: H5, L6, CM2");
    }

    #[test]
    fn render_keeps_unknown_placeholders() {
        let t = RunTemplate {
            description: "{model_name} {epochs}".to_owned(),
        };
        assert_eq!(t.render("m", "v", &[]), "m {epochs}");
    }

    #[test]
    fn describe_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("description.json");
        std::fs::write(&path, r#"{"description": "{model_name}@{data_version}"}"#).unwrap();
        let text = describe_run(&path, "clf", "v2", &labels(&["L6"])).unwrap();
        assert_eq!(text, "clf@v2\n\nLabels: L6");
    }

    #[test]
    fn template_without_description_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"title": "x"}"#).unwrap();
        let err = describe_run(&path, "m", "v", &[]).unwrap_err();
        assert!(matches!(err, DescribeError::Template { .. }));
    }

    #[test]
    fn label_list_is_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        write_label_list(&path, &labels(&["H5", "L6"])).unwrap();
        let back: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, ["H5", "L6"]);
    }
}
