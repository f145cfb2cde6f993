use serde::{Deserialize, Serialize};

use formwork_core::FormResult;

use crate::capabilities::normalize_array;
use crate::config::FieldConfig;
use crate::field::{with_rules, Field, FieldCore, BASE_RULES};
use crate::validator::ValidationRule;
use crate::value::Value;

/// A selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// The file name, including extension.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// The MIME type.
    #[serde(rename = "type", default)]
    pub mime: String,
}

impl FileInfo {
    /// Describes a file.
    pub fn new(name: impl Into<String>, size: u64, mime: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime: mime.into(),
        }
    }

    fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A file upload field. The value is a list of `{name, size, type}`
/// descriptors, checked by the `extension`, `minSize` and `maxSize` rules.
#[derive(Debug)]
pub struct FileField {
    core: FieldCore,
    multiple: bool,
}

impl FileField {
    /// Creates a single-file field.
    pub fn new(config: FieldConfig) -> FormResult<Self> {
        Ok(Self {
            core: FieldCore::new("file", config, Value::Array(Vec::new()))?,
            multiple: false,
        })
    }

    /// Allows several files.
    #[must_use]
    pub const fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// Whether several files are allowed.
    pub const fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// The selected files. Entries that are not file descriptors are skipped.
    pub fn files(&self) -> Vec<FileInfo> {
        normalize_array(&self.core.stored_value())
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    }

    /// Adds a file; a single-file field replaces its current file.
    pub fn add_file(&self, file: FileInfo) {
        let mut files = if self.multiple {
            normalize_array(&self.core.stored_value())
        } else {
            Vec::new()
        };
        files.push(file.to_value());
        self.set_value(Value::Array(files), true);
    }

    /// Removes every file.
    pub fn clear(&self) {
        self.set_value(Value::Array(Vec::new()), true);
    }
}

impl Field for FileField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn value(&self) -> Value {
        Value::Array(normalize_array(&self.core.stored_value()))
    }

    fn set_value(&self, value: Value, update: bool) {
        self.core.store_value(Value::Array(normalize_array(&value)), update);
    }

    fn validations(&self) -> Vec<ValidationRule> {
        let mut rules = BASE_RULES.to_vec();
        rules.extend(["extension", "minSize", "maxSize"]);
        with_rules(&self.core, &rules)
    }

    fn render_input(&self) -> String {
        let mut markup = self.core.render_input("file", &Value::Null);
        if self.multiple {
            markup = markup.replacen('>', " multiple>", 1);
        }
        markup
    }
}
