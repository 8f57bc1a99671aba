mod catalog;
mod ids;

pub use catalog::{Catalog, ChannelDescriptor, Scene};
pub use ids::{AssetRef, ChannelKey};
