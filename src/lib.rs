//! graphsmith: a chart-building core.
//!
//! A project is a tabular dataset, an ordered pipeline of transforms and a
//! chart configuration. [`app::AppState`] owns the current project with
//! undo/redo history; [`transform::apply`] runs the pipeline; renderers in
//! [`render`] draw the post-transform dataset; [`project_io`] saves and
//! loads projects.

pub mod app;
pub mod constants;
pub mod data;
pub mod logging;
pub mod perf;
pub mod project;
pub mod project_io;
pub mod render;
pub mod settings;
pub mod transform;
pub mod types;

pub use app::{AppState, StateError, Subscription};
pub use data::{DataError, TabularDataset};
pub use project::ProjectState;
pub use settings::Settings;
pub use transform::{Transform, TransformKind};
