pub mod pool;
pub mod results;
pub mod window;
