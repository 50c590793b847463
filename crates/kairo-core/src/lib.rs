pub mod dialing;
pub mod domain;
pub mod dto;
pub mod error;
pub mod matching;
pub mod report;
pub mod variations;

pub use dialing::{DialingCodeRule, DialingRuleTable};
pub use domain::*;
pub use dto::*;
pub use error::{
    CoreError, DialingTableError, DirectoryError, PhoneError, ReconcileError, ValidationError,
};
pub use matching::{
    BatchMatcher, ClaimPolicy, Directory, MatchObserver, MatchOptions, MatchResult, MatchType,
    MemoryDirectory, NoopObserver, TracingObserver,
};
pub use report::ReconciliationReport;
pub use variations::{PhoneVariations, VariationGenerator};
