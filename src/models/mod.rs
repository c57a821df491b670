pub mod image;
pub mod page;

pub use image::ImageResult;
pub use page::Page;
