//! Scene serialization
//!
//! Scenes are encoded into a [`FieldTree`] by the [`SceneSerializer`] and
//! written out as RON. Entity ids are stored raw so a load reproduces the
//! same identities and hierarchy links.

pub mod tree;
pub mod scene_codec;

use serde::{Serialize, Deserialize};

pub use tree::{DecodeError, Field, FieldTree, FromField, IntoField};
pub use scene_codec::{DecodeContext, LoadIssue, LoadReport, SceneSerializer, SerializationError};

/// What to do with a component whose stored value cannot be decoded.
///
/// Either way the rest of the entity and the scene still load and the
/// failure is recorded in the [`LoadReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecodePolicy {
    /// Attach a default-initialized component in its place
    #[default]
    DefaultInitialize,
    /// Leave the component off the entity
    SkipComponent,
}
