//! Page Components

mod catalog;
mod success;

pub use catalog::CatalogPage;
pub use success::SuccessPage;
