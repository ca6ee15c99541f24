pub mod interjection;

pub use interjection::{is_interjection_candidate, InterjectionScheduler};
