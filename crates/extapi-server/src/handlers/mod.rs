pub mod custom_fields;
pub mod queries;
pub mod system;
pub mod time_entries;
