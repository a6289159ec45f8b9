pub mod resource;

pub use resource::{
    InMemoryResourceProvider, ResourceError, ResourceProvider, SharedResourceData, resource_key,
};
