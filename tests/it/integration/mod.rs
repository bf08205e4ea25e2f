//! Integration tests for graphsmith.
//!
//! These tests drive AppState, the transform pipeline, persistence and
//! rendering together the way an application would.

mod pipeline_tests;
mod project_io_tests;
mod propagation_tests;
mod property_tests;
mod undo_redo_tests;
