pub mod candidates;
pub mod geo;
pub mod scanner;
pub mod strikes;
pub mod swipes;
pub mod suggest;
