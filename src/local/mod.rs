mod file;
mod repository;

pub use file::LocalFile;
pub use repository::LocalRepository;
