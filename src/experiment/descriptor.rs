//! Run Descriptor - structured replication identifier
//!
//! Legacy runs carry their identifier as digits at the end of the first
//! line of the free-text description: `...1007` for baseline runs and
//! `...2-1007` for query-modulated runs (replication level 2). The text
//! is decoded once, here, and only the structured form travels further.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Condition dimension a run belongs to (`run_id / 1000 - 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Color queries (run ids 1000..2000).
    Color,
    /// Shape queries (run ids 2000..3000).
    Shape,
    /// Texture queries (run ids 3000..4000).
    Texture,
}

impl Dimension {
    /// All dimensions in index order.
    pub const ALL: [Self; 3] = [Self::Color, Self::Shape, Self::Texture];

    /// Zero-based dimension index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Color => 0,
            Self::Shape => 1,
            Self::Texture => 2,
        }
    }

    /// Lowercase dimension name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Shape => "shape",
            Self::Texture => "texture",
        }
    }

    /// Dimension for a zero-based index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Color),
            1 => Some(Self::Shape),
            2 => Some(Self::Texture),
            _ => None,
        }
    }
}

/// Structured run identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunDescriptor {
    level: Option<u32>,
    run_id: u32,
    dimension: Dimension,
}

impl RunDescriptor {
    /// Descriptor of a baseline (unmodulated) run.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRunDescriptor` if `run_id` does not map to a dimension.
    pub fn baseline(run_id: u32) -> Result<Self> {
        Self::validated(None, run_id)
    }

    /// Descriptor of a query-modulated run at replication `level`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRunDescriptor` if `run_id` does not map to a dimension
    /// or the level is zero.
    pub fn modulated(level: u32, run_id: u32) -> Result<Self> {
        if level == 0 {
            return Err(Error::InvalidRunDescriptor(
                "replication level must be at least 1".to_string(),
            ));
        }
        Self::validated(Some(level), run_id)
    }

    fn validated(level: Option<u32>, run_id: u32) -> Result<Self> {
        let dimension = (run_id / 1000)
            .checked_sub(1)
            .and_then(|d| Dimension::from_index(d as usize))
            .ok_or_else(|| {
                Error::InvalidRunDescriptor(format!(
                    "run id {run_id} does not map to a condition dimension"
                ))
            })?;
        Ok(Self {
            level,
            run_id,
            dimension,
        })
    }

    /// Decode a baseline description (`...XXXX` on the first line).
    ///
    /// # Errors
    ///
    /// Returns `InvalidRunDescriptor` if the first line does not end in four digits.
    pub fn parse_baseline(description: &str) -> Result<Self> {
        let line = first_line(description);
        let run_id = parse_digits(suffix(line, 4)?, description)?;
        Self::baseline(run_id)
    }

    /// Decode a query-modulated description (`...L-XXXX` on the first line).
    ///
    /// # Errors
    ///
    /// Returns `InvalidRunDescriptor` if the first line does not end in `L-XXXX`.
    pub fn parse_modulated(description: &str) -> Result<Self> {
        let line = first_line(description);
        let tail = suffix(line, 6)?;
        let (level, run_id) = tail.split_once('-').ok_or_else(|| {
            Error::InvalidRunDescriptor(format!("expected 'L-XXXX' suffix in {description:?}"))
        })?;
        Self::modulated(
            parse_digits(level, description)?,
            parse_digits(run_id, description)?,
        )
    }

    /// Decode either form, preferring the modulated `L-XXXX` suffix.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRunDescriptor` if neither form matches.
    pub fn parse(description: &str) -> Result<Self> {
        let line = first_line(description);
        let bytes = line.as_bytes();
        let n = bytes.len();
        if n >= 6 && bytes[n - 5] == b'-' && bytes[n - 6].is_ascii_digit() {
            Self::parse_modulated(description)
        } else {
            Self::parse_baseline(description)
        }
    }

    /// Replication level of a query-modulated run.
    #[must_use]
    pub const fn level(&self) -> Option<u32> {
        self.level
    }

    /// Numeric run id (`DXXX`: dimension digit then replication).
    #[must_use]
    pub const fn run_id(&self) -> u32 {
        self.run_id
    }

    /// Replication index within the dimension.
    #[must_use]
    pub const fn replication(&self) -> u32 {
        self.run_id % 1000
    }

    /// Condition dimension.
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }
}

fn first_line(description: &str) -> &str {
    description.lines().next().unwrap_or("").trim_end()
}

fn suffix(line: &str, len: usize) -> Result<&str> {
    line.len()
        .checked_sub(len)
        .and_then(|start| line.get(start..))
        .ok_or_else(|| {
            Error::InvalidRunDescriptor(format!("description line {line:?} is shorter than {len} chars"))
        })
}

fn parse_digits(text: &str, description: &str) -> Result<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidRunDescriptor(format!(
            "expected digits, found {text:?} in {description:?}"
        )));
    }
    text.parse()
        .map_err(|e| Error::InvalidRunDescriptor(format!("{text:?}: {e}")))
}
