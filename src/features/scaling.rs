//! Min-max scaling for the continuous columns
//!
//! The scaler was fit on three columns at once (rainfall, temperature,
//! yield). Each column keeps its own (min, max) and is transformed
//! independently; the row-shaped helpers exist only because callers hold one
//! side of that joint fit at a time and pad the other columns with a
//! placeholder.

use std::fmt;

/// Columns of the jointly fit scaler, in fit order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalerColumn {
    Rainfall = 0,
    Temperature = 1,
    Yield = 2,
}

impl ScalerColumn {
    pub const ALL: [ScalerColumn; 3] = [
        ScalerColumn::Rainfall,
        ScalerColumn::Temperature,
        ScalerColumn::Yield,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ScalerColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalerColumn::Rainfall => write!(f, "Rainfall_mm"),
            ScalerColumn::Temperature => write!(f, "Temperature_Celsius"),
            ScalerColumn::Yield => write!(f, "Yield"),
        }
    }
}

/// Value used for columns of a scaler row that the caller does not need
pub const PLACEHOLDER: f64 = 0.0;

/// Trained (min, max) for one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRange {
    pub min: f64,
    pub max: f64,
}

impl ColumnRange {
    pub fn new(min: f64, max: f64) -> std::result::Result<Self, String> {
        if !min.is_finite() || !max.is_finite() {
            return Err(format!("non-finite range [{}, {}]", min, max));
        }
        if max <= min {
            return Err(format!("max {} must exceed min {}", max, min));
        }
        Ok(ColumnRange { min, max })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Scaler state for rainfall, temperature and yield.
///
/// No clamping: inputs outside the trained range map outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureScaler {
    ranges: [ColumnRange; 3],
}

impl FeatureScaler {
    pub fn new(rainfall: ColumnRange, temperature: ColumnRange, yield_range: ColumnRange) -> Self {
        FeatureScaler {
            ranges: [rainfall, temperature, yield_range],
        }
    }

    pub fn range(&self, column: ScalerColumn) -> ColumnRange {
        self.ranges[column.index()]
    }

    pub fn normalize(&self, column: ScalerColumn, raw: f64) -> f64 {
        let range = self.range(column);
        (raw - range.min) / range.span()
    }

    pub fn denormalize(&self, column: ScalerColumn, normalized: f64) -> f64 {
        let range = self.range(column);
        normalized * range.span() + range.min
    }

    /// Normalize a full scaler row, column by column
    pub fn normalize_row(&self, row: [f64; 3]) -> [f64; 3] {
        ScalerColumn::ALL.map(|c| self.normalize(c, row[c.index()]))
    }

    /// Denormalize a full scaler row, column by column
    pub fn denormalize_row(&self, row: [f64; 3]) -> [f64; 3] {
        ScalerColumn::ALL.map(|c| self.denormalize(c, row[c.index()]))
    }

    /// Normalize the two input columns, padding yield with a placeholder
    pub fn normalize_inputs(&self, rainfall: f64, temperature: f64) -> (f64, f64) {
        let scaled = self.normalize_row([rainfall, temperature, PLACEHOLDER]);
        (
            scaled[ScalerColumn::Rainfall.index()],
            scaled[ScalerColumn::Temperature.index()],
        )
    }

    /// Recover a real yield from the model's normalized output
    pub fn denormalize_yield(&self, normalized: f64) -> f64 {
        self.denormalize_row([PLACEHOLDER, PLACEHOLDER, normalized])[ScalerColumn::Yield.index()]
    }
}
