//! Public types for the tunemetrics API.

mod round;
mod track;

pub use round::RoundData;
pub use track::{Album, ArtistRef, Image, Track};
