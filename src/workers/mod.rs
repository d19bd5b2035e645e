pub mod devotional;

pub use devotional::DevotionalWorker;
