pub mod camera;
pub mod clock;
pub mod coord;
pub mod hexpath;
pub mod layout;
pub mod ratio;
