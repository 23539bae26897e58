mod key;
pub mod batch;
pub mod raster;
pub mod resolver;
pub mod source;

pub use key::SpriteKey;
pub use resolver::{Resolution, Resolver, Tier};
pub use source::{HttpFetcher, IconFetcher, SourceDescriptor};
