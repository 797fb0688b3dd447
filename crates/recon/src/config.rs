use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ReconError;
use crate::field::FieldKind;

pub const DEFAULT_GROUP_BY: &str = "subject_id";
pub const DEFAULT_ROW_KEY: &str = "classification_id";
pub const DEFAULT_USER_COLUMN: &str = "user_name";
pub const DEFAULT_FUZZY_RATIO_THRESHOLD: i32 = 90;
pub const DEFAULT_FUZZY_SET_THRESHOLD: i32 = 50;
pub const DEFAULT_JOIN_DISTANCE: u32 = 6;
pub const DEFAULT_MAX_TRANSCRIPTIONS: usize = 50;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Effective run configuration shared by the adapters and the engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    /// Column whose value groups classifications into subjects.
    pub group_by: String,
    /// Column identifying a single classification.
    pub row_key: String,
    /// Column naming the volunteer. `None` disables transcriber stats and weights.
    pub user_column: Option<String>,
    pub workflow_id: Option<u64>,
    pub workflow_name: Option<String>,
    /// Partial-ratio cutoff (0-100) for fuzzy text matches.
    pub fuzzy_ratio_threshold: i32,
    /// Token-set-ratio cutoff (0-100) for fuzzy text matches.
    pub fuzzy_set_threshold: i32,
    /// Highlights closer than this many characters are joined.
    pub join_distance: u32,
    /// Rows kept per group, in input order. `None` keeps every row.
    pub max_transcriptions: Option<usize>,
    pub column_types: BTreeMap<String, FieldKind>,
    /// Score adjustments for text matches, keyed by user name.
    pub user_weights: BTreeMap<String, i32>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            group_by: DEFAULT_GROUP_BY.into(),
            row_key: DEFAULT_ROW_KEY.into(),
            user_column: Some(DEFAULT_USER_COLUMN.into()),
            workflow_id: None,
            workflow_name: None,
            fuzzy_ratio_threshold: DEFAULT_FUZZY_RATIO_THRESHOLD,
            fuzzy_set_threshold: DEFAULT_FUZZY_SET_THRESHOLD,
            join_distance: DEFAULT_JOIN_DISTANCE,
            max_transcriptions: Some(DEFAULT_MAX_TRANSCRIPTIONS),
            column_types: BTreeMap::new(),
            user_weights: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let mut config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.user_weights = std::mem::take(&mut config.user_weights)
            .into_iter()
            .map(|(user, weight)| (user.trim().to_lowercase(), weight))
            .collect();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !(0..=100).contains(&self.fuzzy_ratio_threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "fuzzy_ratio_threshold must be between 0 and 100, got {}",
                self.fuzzy_ratio_threshold
            )));
        }

        if !(0..=100).contains(&self.fuzzy_set_threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "fuzzy_set_threshold must be between 0 and 100, got {}",
                self.fuzzy_set_threshold
            )));
        }

        if self.group_by.trim().is_empty() {
            return Err(ReconError::ConfigValidation("group_by must not be empty".into()));
        }

        if self.max_transcriptions == Some(0) {
            return Err(ReconError::ConfigValidation(
                "max_transcriptions must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Merge a `"foo:select,bar:text"` mapping into `column_types`.
    ///
    /// Later entries override earlier ones, so repeated flags behave like
    /// one long list.
    pub fn parse_column_types(&mut self, pairs: &str) -> Result<(), ReconError> {
        for pair in pairs.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (column, kind) = pair.rsplit_once(':').ok_or_else(|| {
                ReconError::ConfigValidation(format!(
                    "column type '{pair}' must look like name:type"
                ))
            })?;
            let column = column.trim();
            let kind = kind.trim();
            let parsed: FieldKind = kind.parse().map_err(|_| ReconError::UnknownFieldType {
                column: column.into(),
                kind: kind.into(),
            })?;
            self.column_types.insert(column.to_string(), parsed);
        }
        Ok(())
    }

    /// Merge a `"alice:10,bob:-5"` weight list into `user_weights`. User
    /// names are stored lowercased.
    pub fn parse_user_weights(&mut self, pairs: &str) -> Result<(), ReconError> {
        for pair in pairs.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (user, weight) = pair.rsplit_once(':').ok_or_else(|| {
                ReconError::ConfigValidation(format!(
                    "user weight '{pair}' must look like user:weight"
                ))
            })?;
            let weight: i32 = weight.trim().parse().map_err(|_| {
                ReconError::ConfigValidation(format!(
                    "user weight for '{}' is not an integer: '{}'",
                    user.trim(),
                    weight.trim()
                ))
            })?;
            self.user_weights.insert(user.trim().to_lowercase(), weight);
        }
        Ok(())
    }

    /// Field variant used for `column`. The group-by column is always `Same`;
    /// unmapped columns are `NoOp`.
    pub fn kind_for(&self, column: &str) -> FieldKind {
        if column == self.group_by {
            return FieldKind::Same;
        }
        self.column_types.get(column).copied().unwrap_or(FieldKind::NoOp)
    }

    /// Weight for `user`, matched case-insensitively.
    pub fn user_weight(&self, user: Option<&str>) -> i32 {
        user.and_then(|u| self.user_weights.get(&u.trim().to_lowercase()))
            .copied()
            .unwrap_or(0)
    }

    /// How error messages and reports name the workflow.
    pub fn workflow_label(&self) -> String {
        match (&self.workflow_name, self.workflow_id) {
            (Some(name), Some(id)) => format!("'{name}' ({id})"),
            (Some(name), None) => format!("'{name}'"),
            (None, Some(id)) => id.to_string(),
            (None, None) => "(unnamed)".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
