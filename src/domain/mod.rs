pub mod demand;
pub mod facility;
pub mod grid;

pub use demand::*;
pub use facility::*;
pub use grid::*;
