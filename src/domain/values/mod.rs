pub mod connection_status;
pub mod format_tag;
pub mod instrument_type;
pub mod side;
pub mod source_kind;
pub mod sync_status;
