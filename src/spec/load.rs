use super::types::Spec;
use crate::error::SpecError;
use serde_json::Value;
use std::path::Path;

/// Document encodings selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
}

impl SpecFormat {
    /// Pick the decoder for a file path (case-insensitive extension).
    ///
    /// # Errors
    ///
    /// [`SpecError::UnknownFileType`] for anything but `json`, `yaml` or `yml`.
    pub fn from_path(path: &Path) -> Result<Self, SpecError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => Ok(SpecFormat::Json),
            "yaml" | "yml" => Ok(SpecFormat::Yaml),
            _ => Err(SpecError::UnknownFileType {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Decode document text in a given format.
///
/// # Errors
///
/// [`SpecError::Decode`] when the text is not valid JSON/YAML.
pub fn parse_document(path: &Path, content: &str, format: SpecFormat) -> Result<Value, SpecError> {
    let decoded = match format {
        SpecFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        SpecFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    };
    decoded.map_err(|message| SpecError::Decode {
        path: path.to_path_buf(),
        message,
    })
}

/// Load and normalize an OpenAPI document from disk.
///
/// The extension is checked before the file is read, so an unsupported file
/// type is reported even when the file does not exist.
///
/// # Errors
///
/// [`SpecError::UnknownFileType`], [`SpecError::Io`], [`SpecError::Decode`],
/// or any error of [`Spec::from_value`].
pub fn load_spec(path: impl AsRef<Path>) -> Result<Spec, SpecError> {
    let path = path.as_ref();
    let format = SpecFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = parse_document(path, &content, format)?;
    tracing::debug!(path = %path.display(), ?format, "Decoded specification file");
    Spec::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extension_selects_format() {
        assert_eq!(SpecFormat::from_path(Path::new("a.json")).unwrap(), SpecFormat::Json);
        assert_eq!(SpecFormat::from_path(Path::new("a.YAML")).unwrap(), SpecFormat::Yaml);
        assert_eq!(SpecFormat::from_path(Path::new("a.yml")).unwrap(), SpecFormat::Yaml);
    }

    #[test]
    fn unknown_extension_is_rejected_before_reading() {
        let err = load_spec(PathBuf::from("/does/not/exist/openapi.unknown")).unwrap_err();
        match err {
            SpecError::UnknownFileType { extension, .. } => assert_eq!(extension, "unknown"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_spec("/does/not/exist/openapi.json").unwrap_err();
        assert!(matches!(err, SpecError::Io { .. }));
    }

    #[test]
    fn yaml_decode_error_names_path() {
        let err = parse_document(Path::new("bad.yaml"), "paths: [unclosed", SpecFormat::Yaml)
            .unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }
}
