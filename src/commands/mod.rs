pub mod convert;
pub mod relay;
