pub mod capture;
pub mod print;
