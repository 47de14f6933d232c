use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod features;
pub mod outfit;
pub mod user;
pub mod user_image;
pub mod wishlist;

pub use features::UserFeatures;
pub use outfit::Outfit;
pub use user::User;
pub use user_image::UserImage;
pub use wishlist::WishlistItem;

/// Body shape label derived from pose landmark ratios
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BodyShape {
    Hourglass,
    Apple,
    Pear,
    Rectangle,
    #[serde(rename = "Inverted Triangle")]
    InvertedTriangle,
    Unknown,
}

impl BodyShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyShape::Hourglass => "Hourglass",
            BodyShape::Apple => "Apple",
            BodyShape::Pear => "Pear",
            BodyShape::Rectangle => "Rectangle",
            BodyShape::InvertedTriangle => "Inverted Triangle",
            BodyShape::Unknown => "Unknown",
        }
    }
}

impl Display for BodyShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Skin tone label derived from skin-pixel lightness
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkinTone {
    Fair,
    Medium,
    Tan,
    Deep,
    Unknown,
}

impl SkinTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkinTone::Fair => "Fair",
            SkinTone::Medium => "Medium",
            SkinTone::Tan => "Tan",
            SkinTone::Deep => "Deep",
            SkinTone::Unknown => "Unknown",
        }
    }
}

impl Display for SkinTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
