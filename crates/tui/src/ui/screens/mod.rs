pub mod grid;
pub mod payoff;
