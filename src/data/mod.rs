pub mod bitmap;
pub mod dict;
pub mod list;
pub mod set;
pub mod skiplist;
pub mod zset;

pub use bitmap::Bitmap;
pub use dict::Dict;
pub use list::List;
pub use set::Set;
pub use skiplist::SkipList;
pub use zset::SortedSet;
