//! Reconciliation services between the event workbook and normalized records

pub mod allocator;
pub mod approach;
pub mod columns;
pub mod events;
pub mod frequency;
pub mod insert;
pub mod pending;
pub mod search;
pub mod updater;
pub mod ute;
