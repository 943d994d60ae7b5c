//! Rigid layout of the approach-log sheet
//!
//! Unlike station and panel sheets, the approach log is written only by this
//! tool, so its columns are fixed by position rather than resolved by name.
//! Layout drift here goes unnoticed: reads pick up whatever sits in the
//! expected column.

use super::columns::RecordField;
use super::updater::EditableField;
use crate::api::A1Range;

/// Zero-based column positions (H = 7)
pub mod cols {
    pub const ID: u32 = 7; // H
    pub const LOCAL: u32 = 8; // I
    pub const FISCAL: u32 = 9; // J
    pub const DATE: u32 = 10; // K
    pub const TIME: u32 = 11; // L
    pub const FREQUENCY: u32 = 12; // M
    pub const BANDWIDTH: u32 = 13; // N
    pub const BAND: u32 = 14; // O
    pub const IDENTIFICATION: u32 = 15; // P
    pub const AUTHORIZED: u32 = 16; // Q
    pub const UTE: u32 = 17; // R
    pub const SEI_PROCESS: u32 = 18; // S
    pub const OBSERVATIONS: u32 = 19; // T
    pub const OTHER_AWARE: u32 = 20; // U
    pub const INTERFERENT: u32 = 21; // V
    pub const STATUS: u32 = 22; // W

    // BSR/jammer and fake base-station sightings share the sheet
    pub const BSR_COUNT: u32 = 23; // X
    pub const BSR_REGION: u32 = 24; // Y
    pub const ERB_COUNT: u32 = 25; // Z
    pub const ERB_REGION: u32 = 26; // AA
    pub const LATITUDE: u32 = 27; // AB
    pub const LONGITUDE: u32 = 28; // AC
}

/// First data row (row 1 is the header)
pub const FIRST_DATA_ROW: u32 = 2;

/// The emission block H1:W, header included
pub fn emission_block() -> A1Range {
    A1Range::columns_from(cols::ID, cols::STATUS, 1)
}

/// Column of a record field within the emission block
pub fn record_column(field: RecordField) -> u32 {
    match field {
        RecordField::Id => cols::ID,
        RecordField::Station => cols::LOCAL,
        RecordField::Fiscal => cols::FISCAL,
        RecordField::Date => cols::DATE,
        RecordField::Time => cols::TIME,
        RecordField::Frequency => cols::FREQUENCY,
        RecordField::Bandwidth => cols::BANDWIDTH,
        RecordField::Band => cols::BAND,
        RecordField::Identification => cols::IDENTIFICATION,
        RecordField::Authorized => cols::AUTHORIZED,
        RecordField::Ute => cols::UTE,
        RecordField::SeiProcess => cols::SEI_PROCESS,
        RecordField::Observations => cols::OBSERVATIONS,
        RecordField::OtherAware => cols::OTHER_AWARE,
        RecordField::Interferent => cols::INTERFERENT,
        RecordField::Status => cols::STATUS,
    }
}

/// Write target of an editable field
pub fn editable_column(field: EditableField) -> u32 {
    record_column(field.record_field())
}

/// Cell of `col` in a row read from the emission block (row starts at H)
pub fn block_cell(row: &[String], col: u32) -> &str {
    row.get((col - cols::ID) as usize)
        .map(String::as_str)
        .unwrap_or("")
}
