pub mod debug;
pub mod lint;
pub mod run;
