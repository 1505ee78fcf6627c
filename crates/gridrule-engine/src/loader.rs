//! Level loading.
//!
//! A [`LevelSource`] carries raw level data as a JSON value plus an optional
//! format and width. Supported layouts:
//!
//! | format   | data                                        |
//! |----------|---------------------------------------------|
//! | `string` | one string, chunked into rows of `width`    |
//! | `lines`  | one string, rows separated by `\n`          |
//! | `grid`   | an array of rows (arrays or strings)        |
//! | `flat`   | an array of cells, chunked by `width`       |
//! | `object` | `{ "width", "height", "data" }`, recursing  |
//!
//! Without an explicit format the layout is detected from the data's shape.
//! Characters become symbol keys, JSON integers become numeric keys.
//!
//! ```
//! use gridrule_engine::loader::LevelSource;
//! use gridrule_core::key::CellKey;
//!
//! let level = LevelSource::string("#.#.", 2).parse().unwrap();
//! assert_eq!(level.rows(), vec![
//!     vec![CellKey::from('#'), CellKey::from('.')],
//!     vec![CellKey::from('#'), CellKey::from('.')],
//! ]);
//! ```

use std::fmt;

use gridrule_core::key::CellKey;
use gridrule_core::level::Level;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelFormat {
    String,
    Lines,
    Grid,
    Flat,
    Object,
}

impl fmt::Display for LevelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LevelFormat::String => "string",
            LevelFormat::Lines => "lines",
            LevelFormat::Grid => "grid",
            LevelFormat::Flat => "flat",
            LevelFormat::Object => "object",
        };
        f.write_str(name)
    }
}

/// Failures specific to decoding level data. Shape failures of the decoded
/// grid are [`LevelError`](gridrule_core::LevelError)s.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("{format} level data needs a width")]
    MissingWidth { format: LevelFormat },

    #[error("{format} level data cannot be read from a JSON {found}")]
    WrongShape { format: LevelFormat, found: &'static str },

    #[error("cannot detect the format of level data from a JSON {found}")]
    Undetectable { found: &'static str },

    #[error("unsupported cell value {value}")]
    BadCell { value: String },

    #[error("level dimension must be a non-negative integer, got {value}")]
    BadDimension { value: String },

    #[error("level declares height {expected} but has {found} rows")]
    HeightMismatch { expected: usize, found: usize },
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Raw level data waiting to be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSource {
    #[serde(default)]
    pub format: Option<LevelFormat>,
    #[serde(default)]
    pub width: Option<usize>,
    pub data: Value,
}

impl LevelSource {
    /// Auto-detected source.
    pub fn new(data: Value) -> Self {
        Self {
            format: None,
            width: None,
            data,
        }
    }

    /// A flat string chunked into rows of `width` characters.
    pub fn string(data: &str, width: usize) -> Self {
        Self {
            format: Some(LevelFormat::String),
            width: Some(width),
            data: Value::String(data.to_owned()),
        }
    }

    /// Newline-separated rows.
    pub fn lines(data: &str) -> Self {
        Self {
            format: Some(LevelFormat::Lines),
            width: None,
            data: Value::String(data.to_owned()),
        }
    }

    /// The format this source will be parsed as.
    pub fn detect(&self) -> Result<LevelFormat, EngineError> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        let format = match &self.data {
            Value::Object(_) => LevelFormat::Object,
            Value::String(s) if s.contains('\n') => LevelFormat::Lines,
            Value::String(_) => LevelFormat::String,
            Value::Array(items) if items.first().is_some_and(Value::is_array) => LevelFormat::Grid,
            Value::Array(_) => LevelFormat::Flat,
            other => {
                return Err(LoaderError::Undetectable {
                    found: kind_of(other),
                }
                .into())
            }
        };
        Ok(format)
    }

    pub fn parse(&self) -> Result<Level, EngineError> {
        let format = self.detect()?;
        let wrong_shape = || LoaderError::WrongShape {
            format,
            found: kind_of(&self.data),
        };
        let need_width = || self.width.ok_or(LoaderError::MissingWidth { format });

        let level = match (format, &self.data) {
            (LevelFormat::String, Value::String(s)) => {
                let cells: Vec<CellKey> = s.chars().map(CellKey::from).collect();
                chunked(need_width()?, cells)?
            }
            (LevelFormat::Lines, Value::String(s)) => {
                let mut rows: Vec<&str> = s.split('\n').map(|r| r.strip_suffix('\r').unwrap_or(r)).collect();
                if rows.last() == Some(&"") {
                    rows.pop();
                }
                Level::from_rows(rows.into_iter().map(|r| r.chars().map(CellKey::from).collect()).collect())?
            }
            (LevelFormat::Grid, Value::Array(rows)) => {
                let rows = rows.iter().map(row).collect::<Result<Vec<_>, _>>()?;
                Level::from_rows(rows)?
            }
            (LevelFormat::Flat, Value::Array(items)) => {
                let cells = items.iter().map(cell).collect::<Result<Vec<_>, _>>()?;
                chunked(need_width()?, cells)?
            }
            (LevelFormat::Object, Value::Object(map)) => {
                let width = match map.get("width") {
                    Some(w) => Some(as_usize(w)?),
                    None => self.width,
                };
                let height = map.get("height").map(as_usize).transpose()?;
                let data = map.get("data").cloned().unwrap_or(Value::Null);
                let inner = LevelSource {
                    format: None,
                    width,
                    data,
                };
                if inner.detect()? == LevelFormat::Object {
                    return Err(wrong_shape().into());
                }
                let level = inner.parse()?;
                if let Some(expected) = height {
                    if expected != level.height() {
                        return Err(LoaderError::HeightMismatch {
                            expected,
                            found: level.height(),
                        }
                        .into());
                    }
                }
                level
            }
            _ => return Err(wrong_shape().into()),
        };

        tracing::debug!(
            %format,
            width = level.width(),
            height = level.height(),
            "parsed level"
        );
        Ok(level)
    }
}

fn chunked(width: usize, cells: Vec<CellKey>) -> Result<Level, EngineError> {
    if width == 0 {
        return Err(gridrule_core::LevelError::ZeroWidth.into());
    }
    let height = cells.len().div_ceil(width);
    Ok(Level::from_cells(width, height, cells)?)
}

fn as_usize(value: &Value) -> Result<usize, LoaderError> {
    value
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| LoaderError::BadDimension {
            value: value.to_string(),
        })
}

fn row(value: &Value) -> Result<Vec<CellKey>, LoaderError> {
    match value {
        Value::String(s) => Ok(s.chars().map(CellKey::from).collect()),
        Value::Array(items) => items.iter().map(cell).collect(),
        other => Err(LoaderError::WrongShape {
            format: LevelFormat::Grid,
            found: kind_of(other),
        }),
    }
}

fn cell(value: &Value) -> Result<CellKey, LoaderError> {
    match value {
        Value::String(s) => Ok(CellKey::from(s.as_str())),
        Value::Number(n) => n.as_i64().map(CellKey::Num).ok_or_else(|| LoaderError::BadCell {
            value: n.to_string(),
        }),
        other => Err(LoaderError::BadCell {
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(s: &str) -> Vec<CellKey> {
        s.chars().map(CellKey::from).collect()
    }

    #[test]
    fn string_is_chunked_by_width() {
        let level = LevelSource::string("#.#.", 2).parse().unwrap();
        assert_eq!(level.rows(), vec![keys("#."), keys("#.")]);
    }

    #[test]
    fn string_without_width_fails() {
        let source = LevelSource {
            format: Some(LevelFormat::String),
            width: None,
            data: json!("##"),
        };
        assert!(matches!(
            source.parse(),
            Err(EngineError::Loader(LoaderError::MissingWidth { .. }))
        ));
    }

    #[test]
    fn uneven_string_is_a_level_error() {
        let err = LevelSource::string("#.#", 2).parse().unwrap_err();
        assert!(matches!(err, EngineError::Level(_)));
    }

    #[test]
    fn lines_drop_trailing_newline_and_cr() {
        let level = LevelSource::lines("#.\r\n.#\n").parse().unwrap();
        assert_eq!(level.rows(), vec![keys("#."), keys(".#")]);
    }

    #[test]
    fn detection_by_shape() {
        assert_eq!(LevelSource::new(json!("ab\ncd")).detect().unwrap(), LevelFormat::Lines);
        assert_eq!(LevelSource::new(json!("abcd")).detect().unwrap(), LevelFormat::String);
        assert_eq!(LevelSource::new(json!([["a"]])).detect().unwrap(), LevelFormat::Grid);
        assert_eq!(LevelSource::new(json!(["a", 1])).detect().unwrap(), LevelFormat::Flat);
        assert_eq!(LevelSource::new(json!({"data": "a"})).detect().unwrap(), LevelFormat::Object);
        assert!(LevelSource::new(json!(3)).detect().is_err());
    }

    #[test]
    fn grid_accepts_string_rows_and_numbers() {
        let level = LevelSource::new(json!([["#", 1], ".2"])).parse().unwrap();
        assert_eq!(level.get(1, 0), Some(&CellKey::Num(1)));
        assert_eq!(level.get(1, 1), Some(&CellKey::from('2')));
    }

    #[test]
    fn flat_uses_width() {
        let source = LevelSource {
            format: None,
            width: Some(3),
            data: json!([0, 0, 1, 1, 0, 0]),
        };
        let level = source.parse().unwrap();
        assert_eq!((level.width(), level.height()), (3, 2));
        assert_eq!(level.get(2, 0), Some(&CellKey::Num(1)));
    }

    #[test]
    fn object_recurses_and_checks_height() {
        let level = LevelSource::new(json!({"width": 2, "height": 2, "data": "#..#"}))
            .parse()
            .unwrap();
        assert_eq!(level.rows(), vec![keys("#."), keys(".#")]);

        let err = LevelSource::new(json!({"width": 2, "height": 3, "data": "#..#"}))
            .parse()
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Loader(LoaderError::HeightMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn explicit_format_must_match_data() {
        let source = LevelSource {
            format: Some(LevelFormat::Grid),
            width: None,
            data: json!("##"),
        };
        assert!(matches!(
            source.parse(),
            Err(EngineError::Loader(LoaderError::WrongShape { .. }))
        ));
    }

    #[test]
    fn source_deserializes_from_json() {
        let source: LevelSource =
            serde_json::from_str(r##"{ "format": "string", "width": 2, "data": "#.#." }"##).unwrap();
        assert_eq!(source.format, Some(LevelFormat::String));
        assert_eq!(source.parse().unwrap().height(), 2);
    }
}
