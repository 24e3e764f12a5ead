//! src/transforms/mod.rs
//!
//! ```text
//! transforms/
//! ├── base.rs            → decide/apply protocol (BaseTransform, TransformParams)
//! ├── typed.rs           → per-item-type handler dispatch
//! ├── data_dependent.rs  → shared-frame validation
//! ├── stream.rs          → Stream and SelectiveStream composition
//! ├── registry.rs        → transforms constructible from keyword parameters
//! ├── core.rs            → deterministic Transform<I, O> chaining
//! └── vision/            → leaf transforms and tensor conversion
//! ```

pub mod base;
pub mod core;
pub mod data_dependent;
pub mod registry;
pub mod stream;
pub mod typed;
pub mod vision;

pub use base::{BaseTransform, Descriptor, TransformParams};
pub use self::core::{Chain, Transform};
pub use registry::{build_transform, registry, FromParams};
pub use stream::{SelectiveStream, Stream};
pub use typed::{Handlers, Targets, TypedTransform};
