pub mod check;
pub mod input;
pub mod layout;
pub mod stats;
pub mod version;
