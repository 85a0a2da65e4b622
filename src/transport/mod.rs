/// Filesystem reads, encoding resolution, and directory walking.
pub mod fs;
