//! Default implementations of the engine's pluggable collaborators.
//!
//! These let the engine run with zero external configuration. Each can be
//! replaced via the [`EngineBuilder`](crate::engine::EngineBuilder) or by
//! passing a different [`SessionAssets`](crate::traits::SessionAssets).

pub mod clock;
pub mod file_assets;
pub mod static_assets;

pub use clock::{FixedClock, RandomUuids, SequentialUuids, SystemClock};
pub use file_assets::FileAssets;
pub use static_assets::StaticAssets;
