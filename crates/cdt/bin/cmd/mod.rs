pub mod inspect;
pub mod transform;
