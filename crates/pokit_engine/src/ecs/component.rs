//! Component naming and typed component views
//!
//! Components are stored as structured values keyed by name. Modules that
//! own a component can give it a Rust shape by implementing [`Component`]
//! and reading or writing it through the typed accessors on
//! [`World`](super::World).

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Name of the implicit transform component every entity carries
pub const IDENTITY: &str = "identity";

/// Typed view over a named component value
pub trait Component: Serialize + DeserializeOwned {
    /// Name the component is stored and subscribed under
    const NAME: &'static str;
}
