//! Local side of the cloud mirror.

mod repository;

pub use repository::MirrorRepository;
