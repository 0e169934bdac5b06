pub mod file;
pub mod memory;
pub mod prefs;
pub mod traits;

pub use file::FilePreferenceStore;
pub use memory::MemoryPreferenceStore;
pub use traits::PreferenceStore;
