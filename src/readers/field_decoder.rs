use std::collections::HashMap;

use crate::utils::constants::DAYS_PER_LINE;

/// A parsed numeric field, keeping whether the text was integral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(*i),
            Number::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Number::Float(_) => None,
        }
    }

    fn is_sentinel(&self, sentinels: &[f64]) -> bool {
        let value = self.as_f64();
        sentinels.iter().any(|s| *s == value)
    }
}

/// Integer parse first, floating point second; `None` when neither works.
pub fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::Int(i));
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(Number::Float(f)),
        _ => None,
    }
}

/// Numeric decode with the sentinel rule applied. Blank, corrupt and
/// sentinel-valued text all come back `None`.
pub fn read_number(text: &str, sentinels: &[f64]) -> Option<Number> {
    parse_number(text).filter(|n| !n.is_sentinel(sentinels))
}

/// Presence flag: true iff the trimmed text is a single character in `valid`.
pub fn read_flag(text: &str, valid: &[char]) -> bool {
    let mut chars = text.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => valid.contains(&c),
        _ => false,
    }
}

/// Byte columns `start..end` of `line`, clamped to the line length.
pub fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("")
}

/// Whether a line carries data: its first column must be a digit.
pub fn has_numeric_lead(line: &str) -> bool {
    line.chars().next().is_some_and(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Number { sentinels: &'static [f64] },
    Text,
    Flag { valid: &'static [char] },
}

/// One column range of a fixed-width layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn number(
        name: &'static str,
        start: usize,
        end: usize,
        sentinels: &'static [f64],
    ) -> Self {
        Self {
            name,
            start,
            end,
            kind: FieldKind::Number { sentinels },
        }
    }

    pub const fn text(name: &'static str, start: usize, end: usize) -> Self {
        Self {
            name,
            start,
            end,
            kind: FieldKind::Text,
        }
    }

    pub const fn flag(name: &'static str, at: usize, valid: &'static [char]) -> Self {
        Self {
            name,
            start: at,
            end: at + 1,
            kind: FieldKind::Flag { valid },
        }
    }

    fn decode(&self, line: &str) -> Option<DecodedValue> {
        let raw = column(line, self.start, self.end);
        match self.kind {
            FieldKind::Number { sentinels } => read_number(raw, sentinels).map(DecodedValue::Number),
            FieldKind::Text => {
                let text = raw.trim();
                (!text.is_empty()).then(|| DecodedValue::Text(text.to_string()))
            }
            FieldKind::Flag { valid } => Some(DecodedValue::Flag(read_flag(raw, valid))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Number(Number),
    Text(String),
    Flag(bool),
}

/// Field-name to value mapping for one line; absent names were undecodable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedLine {
    values: HashMap<&'static str, DecodedValue>,
}

impl DecodedLine {
    pub fn get(&self, name: &str) -> Option<&DecodedValue> {
        self.values.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(DecodedValue::Number(n)) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(DecodedValue::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(DecodedValue::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Flag fields are never absent; unknown names read as false.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(DecodedValue::Flag(true)))
    }
}

/// Column-offset table for one line format.
#[derive(Debug, Clone, Copy)]
pub struct LineLayout {
    pub fields: &'static [FieldSpec],
    /// Only lines starting with a digit are decoded.
    pub numeric_lead: bool,
}

impl LineLayout {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self {
            fields,
            numeric_lead: false,
        }
    }

    pub const fn with_numeric_lead(mut self) -> Self {
        self.numeric_lead = true;
        self
    }

    /// `None` when the line is not eligible (header, blank line).
    pub fn decode(&self, line: &str) -> Option<DecodedLine> {
        if self.numeric_lead && !has_numeric_lead(line) {
            return None;
        }

        let values = self
            .fields
            .iter()
            .filter_map(|spec| spec.decode(line).map(|v| (spec.name, v)))
            .collect();

        Some(DecodedLine { values })
    }
}

/// One non-blank day segment of a monthly multi-value line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySegment<'a> {
    pub day: u32,
    pub text: &'a str,
}

impl<'a> DaySegment<'a> {
    /// Leading numeric value of `width` columns, subject to `sentinels`.
    pub fn value(&self, width: usize, sentinels: &[f64]) -> Option<Number> {
        read_number(column(self.text, 0, width), sentinels)
    }

    /// Single character at `index`, a space when past the end.
    pub fn char_at(&self, index: usize) -> char {
        column(self.text, index, index + 1).chars().next().unwrap_or(' ')
    }
}

/// Iterates the up-to-31 fixed-stride day segments of a monthly line,
/// skipping blank segments (days that do not exist in the month).
#[derive(Debug, Clone)]
pub struct DaySegments<'a> {
    line: &'a str,
    offset: usize,
    stride: usize,
    next_index: usize,
}

impl<'a> DaySegments<'a> {
    pub fn new(line: &'a str, offset: usize, stride: usize) -> Self {
        Self {
            line,
            offset,
            stride,
            next_index: 0,
        }
    }
}

impl<'a> Iterator for DaySegments<'a> {
    type Item = DaySegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < DAYS_PER_LINE {
            let index = self.next_index;
            self.next_index += 1;

            let start = self.offset + index * self.stride;
            if start >= self.line.len() {
                self.next_index = DAYS_PER_LINE;
                return None;
            }

            let text = column(self.line, start, start + self.stride);
            if text.trim().is_empty() {
                continue;
            }

            return Some(DaySegment {
                day: (index + 1) as u32,
                text,
            });
        }
        None
    }
}
