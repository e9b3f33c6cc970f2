pub mod check_algebra;
pub mod check_commands;
pub mod check_interpreter;
pub mod report;
pub mod suite;
