use crate::{address::column_letter_to_index, error::ConfigError, template::TemplateMode};
use serde::{Deserialize, Serialize};
use std::{fs, io::ErrorKind, path::Path};
pub const REGISTRY_ENV: &str = "PLANFILL_REGISTRY";
pub const LOG_ENV: &str = "PLANFILL_LOG";
pub const DEFAULT_REGISTRY_DIR: &str = "templates";
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FillConfig {
    /// Write zero and empty values instead of skipping them.
    pub strict_write: bool,
    pub default_start_row: StartRows,
    pub fallback_label_column: String,
    pub section_order: Vec<String>,
    pub unknown_company: String,
    pub unlabeled_section: String,
    pub header_marker: String,
    pub merge_dynamic_headers: bool,
    pub clear_summary: bool,
}
/// Row used for dynamic sections and the summary table when a template has
/// no anchored section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartRows {
    pub standard: u32,
    pub offset: u32,
}
impl Default for StartRows {
    fn default() -> Self {
        Self {
            standard: 5,
            offset: 5,
        }
    }
}
impl StartRows {
    pub const fn for_mode(self, mode: TemplateMode) -> u32 {
        match mode {
            TemplateMode::Standard => self.standard,
            TemplateMode::Offset => self.offset,
        }
    }
}
impl Default for FillConfig {
    fn default() -> Self {
        Self {
            strict_write: false,
            default_start_row: StartRows::default(),
            fallback_label_column: "A".to_string(),
            section_order: [
                "가설공",
                "토공",
                "배수공",
                "구조물공",
                "철근콘크리트공",
                "포장공",
                "부대공",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            unknown_company: "Unknown".to_string(),
            unlabeled_section: "미분류".to_string(),
            header_marker: "◆".to_string(),
            merge_dynamic_headers: false,
            clear_summary: true,
        }
    }
}
impl FillConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "설정 파일이 없어 기본값을 사용합니다.");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<(), ConfigError> {
        column_letter_to_index(&self.fallback_label_column).map_err(|e| {
            ConfigError::Invalid(format!("fallback_label_column: {e}"))
        })?;
        if self.header_marker.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "header_marker 값이 비어 있습니다.".to_string(),
            ));
        }
        if self.default_start_row.standard == 0 || self.default_start_row.offset == 0 {
            return Err(ConfigError::Invalid(
                "default_start_row 값은 1 이상이어야 합니다.".to_string(),
            ));
        }
        Ok(())
    }
}
