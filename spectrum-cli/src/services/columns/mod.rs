//! Name-based column resolution
//!
//! Station and panel sheets are maintained by hand, so their headers drift in
//! wording, casing and accents. Resolution is two-stage: normalize the header
//! row once, then match each semantic field against it with a pattern over
//! the normalized text. The leftmost matching column wins.

pub mod header;

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

pub use header::{HEADER_SCAN_ROWS, HeaderMarkers, locate_header, locate_header_with};

/// Strip diacritics, lowercase and trim (`" Situação "` -> `"situacao"`)
pub fn normalize_text(s: &str) -> String {
    s.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Predicate over a normalized header cell
#[derive(Debug, Clone, Copy)]
pub enum HeaderPattern {
    Exact(&'static str),
    Contains(&'static str),
    All(&'static [HeaderPattern]),
    Any(&'static [HeaderPattern]),
    Not(&'static HeaderPattern),
}

impl HeaderPattern {
    pub fn matches(&self, normalized: &str) -> bool {
        match self {
            HeaderPattern::Exact(text) => normalized == *text,
            HeaderPattern::Contains(text) => normalized.contains(text),
            HeaderPattern::All(patterns) => patterns.iter().all(|p| p.matches(normalized)),
            HeaderPattern::Any(patterns) => patterns.iter().any(|p| p.matches(normalized)),
            HeaderPattern::Not(pattern) => !pattern.matches(normalized),
        }
    }
}

/// Semantic fields of an emission record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Status,
    Station,
    Id,
    Fiscal,
    Date,
    Time,
    Frequency,
    Bandwidth,
    Band,
    Identification,
    Authorized,
    Ute,
    SeiProcess,
    Observations,
    OtherAware,
    Interferent,
}

impl RecordField {
    pub const ALL: [RecordField; 16] = [
        RecordField::Status,
        RecordField::Station,
        RecordField::Id,
        RecordField::Fiscal,
        RecordField::Date,
        RecordField::Time,
        RecordField::Frequency,
        RecordField::Bandwidth,
        RecordField::Band,
        RecordField::Identification,
        RecordField::Authorized,
        RecordField::Ute,
        RecordField::SeiProcess,
        RecordField::Observations,
        RecordField::OtherAware,
        RecordField::Interferent,
    ];

    /// Header pattern used to find this field in hand-maintained sheets
    pub fn pattern(&self) -> HeaderPattern {
        use HeaderPattern::*;
        match self {
            RecordField::Status => Exact("situacao"),
            RecordField::Station => Contains("estacao"),
            RecordField::Id => Exact("id"),
            RecordField::Fiscal => Contains("fiscal"),
            RecordField::Date => Any(&[Exact("data"), Exact("dia")]),
            RecordField::Time => Any(&[Contains("hh"), Contains("hora")]),
            // "Faixa de Frequência Envolvida" is the band, not the frequency
            RecordField::Frequency => All(&[Contains("frequencia"), Not(&Contains("faixa"))]),
            RecordField::Bandwidth => Contains("largura"),
            RecordField::Band => All(&[Contains("faixa"), Contains("envolvida")]),
            RecordField::Identification => Contains("identificacao"),
            RecordField::Authorized => Contains("autorizado"),
            RecordField::Ute => Any(&[Exact("ute"), Contains("ute?")]),
            RecordField::SeiProcess => All(&[Contains("processo"), Contains("sei")]),
            RecordField::Observations => Any(&[Contains("ocorrencia"), Contains("observa")]),
            RecordField::OtherAware => Contains("ciente"),
            RecordField::Interferent => Contains("interferente"),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            RecordField::Status => "situacao",
            RecordField::Station => "estacao",
            RecordField::Id => "id",
            RecordField::Fiscal => "fiscal",
            RecordField::Date => "data",
            RecordField::Time => "hora",
            RecordField::Frequency => "frequencia",
            RecordField::Bandwidth => "largura",
            RecordField::Band => "faixa",
            RecordField::Identification => "identificacao",
            RecordField::Authorized => "autorizado",
            RecordField::Ute => "ute",
            RecordField::SeiProcess => "processo sei",
            RecordField::Observations => "observacoes",
            RecordField::OtherAware => "ciente",
            RecordField::Interferent => "interferente",
        }
    }
}

/// Field specs for every record field, in declaration order
pub fn record_field_specs() -> Vec<(RecordField, HeaderPattern)> {
    RecordField::ALL.iter().map(|f| (*f, f.pattern())).collect()
}

/// Header row with each cell normalized once
#[derive(Debug, Clone)]
pub struct NormalizedHeader {
    cells: Vec<String>,
}

impl NormalizedHeader {
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Self {
        Self {
            cells: raw.iter().map(|c| normalize_text(c.as_ref())).collect(),
        }
    }

    /// Leftmost column satisfying the pattern
    pub fn find(&self, pattern: &HeaderPattern) -> Option<usize> {
        self.cells.iter().position(|cell| pattern.matches(cell))
    }

    pub fn resolve<F: Copy + Eq + Hash>(&self, specs: &[(F, HeaderPattern)]) -> ColumnMapping<F> {
        let columns = specs
            .iter()
            .filter_map(|(field, pattern)| self.find(pattern).map(|col| (*field, col)))
            .collect();
        ColumnMapping { columns }
    }
}

/// Resolve each field to the leftmost header column matching its pattern.
/// Fields without a match are simply absent from the mapping.
pub fn resolve<S: AsRef<str>, F: Copy + Eq + Hash>(
    header: &[S],
    specs: &[(F, HeaderPattern)],
) -> ColumnMapping<F> {
    NormalizedHeader::new(header).resolve(specs)
}

/// Semantic field -> zero-based column for one read of one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping<F: Eq + Hash> {
    columns: HashMap<F, usize>,
}

impl<F: Copy + Eq + Hash> ColumnMapping<F> {
    pub fn get(&self, field: F) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn contains(&self, field: F) -> bool {
        self.columns.contains_key(&field)
    }

    /// Cell text of `field` in a data row; empty when unresolved or short row
    pub fn value<'a>(&self, row: &'a [String], field: F) -> &'a str {
        self.get(field)
            .and_then(|col| row.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Required fields that did not resolve
    pub fn missing(&self, required: &[F]) -> Vec<F> {
        required
            .iter()
            .filter(|f| !self.contains(**f))
            .copied()
            .collect()
    }
}
