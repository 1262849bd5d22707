pub mod convert;
pub mod profile;
pub mod push;
