pub mod form;
pub mod property;

pub use form::{FileUpload, FormFields};
pub use property::{Identity, Location, NewProperty, Property, PropertyFields, Rates, SellerInfo};
