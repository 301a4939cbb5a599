pub mod player;
pub mod random;
pub mod heuristic;

pub use heuristic::HeuristicPlayer;
pub use player::Player;
pub use random::RandomPlayer;
