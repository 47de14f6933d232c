pub mod body_shape;
pub mod pose;
pub mod recommendation;
pub mod skin_tone;
