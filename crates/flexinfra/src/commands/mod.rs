pub mod deploy;
pub mod plan;
pub mod up;
pub mod validate;
