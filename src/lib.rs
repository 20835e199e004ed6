pub mod cli;
pub mod commands;
pub mod error;

pub mod core {
    pub mod block;
    pub mod block_set;
    pub mod codec;
    pub mod genome;
    pub mod range_index;
    pub mod strand;
    pub mod tree;
    pub mod containers {
        pub mod interval_tree;
    }
}

pub mod io {
    pub mod maf_reader;
    pub mod maf_writer;
    pub mod readers;
}

pub mod utils {
    pub mod util;
}

pub mod constants;

pub use constants::*;
