//! Component trait

/// Marker trait for components
///
/// Components are plain data. `Clone` is required because whole scenes are
/// copied when the simulation takes its working set and when the published
/// snapshot is detached from it.
pub trait Component: 'static + Send + Sync + Clone {}
