pub mod implementations_tests;
pub mod merge_tests;
pub mod refinement_tests;
