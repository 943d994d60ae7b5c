//! Header row detection for sheets whose header position is not fixed
//!
//! Station sheets are authored independently and sometimes carry a title row
//! (or two) above the real header.

use super::{HeaderPattern, NormalizedHeader, RecordField};

/// Rows inspected before giving up and assuming row 0
pub const HEADER_SCAN_ROWS: usize = 6;

/// Marker columns that identify a header row
#[derive(Debug, Clone, Copy)]
pub struct HeaderMarkers {
    pub status: HeaderPattern,
    pub id: HeaderPattern,
    pub date: HeaderPattern,
}

impl Default for HeaderMarkers {
    fn default() -> Self {
        Self {
            status: RecordField::Status.pattern(),
            id: RecordField::Id.pattern(),
            date: RecordField::Date.pattern(),
        }
    }
}

impl HeaderMarkers {
    /// A header has a status column and an id or date column
    pub fn is_header<S: AsRef<str>>(&self, row: &[S]) -> bool {
        let header = NormalizedHeader::new(row);
        header.find(&self.status).is_some()
            && (header.find(&self.id).is_some() || header.find(&self.date).is_some())
    }
}

/// Index of the first row that looks like a header, or 0 if none does
pub fn locate_header_with<S: AsRef<str>>(rows: &[Vec<S>], markers: &HeaderMarkers) -> usize {
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| markers.is_header(row))
        .unwrap_or(0)
}

pub fn locate_header<S: AsRef<str>>(rows: &[Vec<S>]) -> usize {
    locate_header_with(rows, &HeaderMarkers::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_header_on_first_row() {
        let sheet = rows(&[&["ID", "Data", "Situação"], &["1", "10/11/2025", "Pendente"]]);
        assert_eq!(locate_header(&sheet), 0);
    }

    #[test]
    fn test_header_below_title_rows() {
        let sheet = rows(&[
            &["MONITORAÇÃO - POSTO NORTE"],
            &[],
            &["Data", "Frequência", "SITUAÇÃO"],
            &["10/11/2025", "100.1", "Pendente"],
        ]);
        assert_eq!(locate_header(&sheet), 2);
    }

    #[test]
    fn test_status_alone_is_not_a_header() {
        let sheet = rows(&[&["Situação"], &["ID", "Situação"]]);
        assert_eq!(locate_header(&sheet), 1);
    }

    #[test]
    fn test_header_beyond_scan_window_defaults_to_zero() {
        let title: &[&str] = &["titulo"];
        let mut sheet = rows(&[title; 6]);
        sheet.extend(rows(&[&["ID", "Situação"]]));
        assert_eq!(locate_header(&sheet), 0);
    }

    #[test]
    fn test_empty_sheet_defaults_to_zero() {
        let sheet: Vec<Vec<String>> = Vec::new();
        assert_eq!(locate_header(&sheet), 0);
    }
}
