pub mod dag;
pub mod state;

pub use dag::DependencyGraph;
pub use state::NodeState;
