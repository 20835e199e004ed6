/// Branch length assigned when inferring a tree for treeless (pairwise) MAF
/// input.
pub const DEFAULT_BRANCH_LENGTH: f64 = 0.1;

pub const MAF_HEADER: &str = "##maf version=1";
pub const MAF_TRAILER: &str = "##eof maf";
