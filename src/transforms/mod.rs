//! The three record transformations.
//!
//! Each transformation borrows its input slice and returns a new vector of
//! records, so they compose in any order and never touch caller data.

pub mod age;
pub mod company;
pub mod name;

pub use age::{age_on, check_condition, parse_date_of_birth, AgeFilter, DATE_OF_BIRTH_FORMAT};
pub use company::{CompanyAssociator, CompanyIndex, UnmatchedPolicy};
pub use name::NameEnricher;
