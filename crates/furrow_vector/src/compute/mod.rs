pub mod arith;
pub mod cast;
pub mod gather;
pub mod hash;
pub mod scatter;
