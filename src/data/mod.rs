//! Tabular data handed to the engine.

use crate::error::{Error, Result};

pub mod stager;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Render for a data file: numbers in `%g` form, text unchanged.
    pub fn render(&self) -> String {
        match self {
            Value::Number(n) => format_general(*n),
            Value::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Column-major table. Columns must all have the same length; this is checked
/// by [`Matrix::shape`] rather than on construction so callers can build up
/// columns incrementally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    columns: Vec<Vec<Value>>,
}

impl Matrix {
    pub fn new(columns: Vec<Vec<Value>>) -> Self {
        Self { columns }
    }

    pub fn push_column<I, V>(&mut self, column: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.columns.push(column.into_iter().map(Into::into).collect());
    }

    pub fn with_column<I, V>(mut self, column: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_column(column);
        self
    }

    pub fn columns(&self) -> &[Vec<Value>] {
        &self.columns
    }

    /// `(columns, rows)`, or a shape error naming the first column whose length
    /// differs from the first one.
    pub fn shape(&self) -> Result<(usize, usize)> {
        let rows = self.columns.first().map_or(0, Vec::len);
        for (i, col) in self.columns.iter().enumerate() {
            if col.len() != rows {
                return Err(Error::Shape {
                    column: i,
                    expected: rows,
                    found: col.len(),
                });
            }
        }
        Ok((self.columns.len(), rows))
    }

    /// Rows joined with `separator`, as many as the first column has values.
    /// Check [`Matrix::shape`] first; short columns render as empty fields.
    pub fn rows<'a>(&'a self, separator: &'a str) -> impl Iterator<Item = String> + 'a {
        let rows = self.columns.first().map_or(0, Vec::len);
        (0..rows).map(move |r| {
            self.columns
                .iter()
                .map(|col| col.get(r).map(Value::render).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(separator)
        })
    }
}

const PRECISION: i32 = 6;

/// C's `%g` with the default precision of 6 significant digits.
pub fn format_general(v: f64) -> String {
    if v.is_nan() {
        return "nan".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".into() } else { "-inf".into() };
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0".into() } else { "0".into() };
    }

    // Round to the target precision first: the exponent after rounding picks the style
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if (-4..PRECISION).contains(&exp) {
        let decimals = (PRECISION - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, v)).to_string()
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
