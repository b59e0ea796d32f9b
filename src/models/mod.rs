pub mod property;
pub mod user;

pub use property::{
    MediaAsset, PaginatedResponse, PrimaryImage, Property, PropertyCategory, PropertyFilters,
};
pub use user::{User, UserProfile, UserRole};
