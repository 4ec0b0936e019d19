pub mod order;
pub mod person;
pub mod status;
