pub mod chat_generator;
pub mod solc_verify;

pub use chat_generator::ChatCandidateGenerator;
pub use solc_verify::SolcVerifyAdapter;
