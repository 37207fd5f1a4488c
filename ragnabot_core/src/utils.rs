pub mod ai;
pub mod helpers;
pub mod upstream;
