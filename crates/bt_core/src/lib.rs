pub mod classifier;
pub mod context;
pub mod error;
pub mod posting;
pub mod registry;
pub mod signature;
pub mod source;
pub mod storage;
pub mod types;

pub use classifier::SectionClassifier;
pub use context::RunContext;
pub use error::Error;
pub use posting::{CreatedThread, PostingApi, ThreadPostOutcome};
pub use registry::ProjectRegistry;
pub use source::OutlineSource;
pub use storage::{SnapshotKind, SnapshotStore, StateStore};
pub use types::{
    BatchSummary, ChangeDetails, ChangeLabel, ChangeType, ComposedTweet, DiffResult, DiffStats,
    Node, Point, Project, ProjectResult, ProjectState, RunStatus, Section, TweetStatus, UpdatePair,
};

pub type Result<T> = std::result::Result<T, Error>;
