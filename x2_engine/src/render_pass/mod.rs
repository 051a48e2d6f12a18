/// Render passes: declarative settings, compiled passes and the refcounted cache

pub mod render_pass;
pub mod render_pass_manager;

pub use render_pass::*;
pub use render_pass_manager::*;
