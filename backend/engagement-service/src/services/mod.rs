pub mod fanout;
pub mod feed;
pub mod likes;
pub mod scroll;

pub use fanout::{FanoutReport, FanoutWriter, Published};
pub use feed::FeedService;
pub use likes::{LikeReconciliation, LikeRegistry};
pub use scroll::{PostRef, ScrollCursor, ScrollEngine, ScrollPage};
