/// Presentation layer: egui widgets bound to [`crate::state::AppState`].
pub mod dashboard;
pub mod panels;
