pub mod events;
pub mod insert;
pub mod lookup;
pub mod pending;
