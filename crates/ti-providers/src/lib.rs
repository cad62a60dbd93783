//! Provider descriptor, registry, and invocation engine: spec.md §4.1 and
//! §4.3 (components C1 and C3).

mod descriptor;
mod engine;
mod extractors;

pub use descriptor::{ProviderRegistry, ProviderSpec, TemplateOverrides};
pub use engine::{invoke, Response};
pub use extractors::github::Github;
pub use extractors::{Method, ProviderExtractor};
