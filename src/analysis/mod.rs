//! Font statistics and block classification.

mod classifier;
mod font_profile;

pub use classifier::{BlockClassifier, ClassifiedPage, Classification, ClassifyOptions};
pub use font_profile::{size_key, FontProfile, ProfileOptions, SizeStats};
