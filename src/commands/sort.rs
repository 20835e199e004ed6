use crate::{
    cli::SortArgs,
    core::{block_set::BlockSet, genome::Genomes},
    utils::util::Result,
};
use std::rc::Rc;

/// Load a MAF into a block set and rewrite it in deterministic root order.
pub fn sort(args: SortArgs) -> Result<()> {
    let genomes = Rc::new(Genomes::new());
    let ref_genome = genomes.obtain_genome(&args.ref_genome);
    let set = BlockSet::from_maf(
        genomes.clone(),
        ref_genome,
        &args.input,
        args.branch_length,
    )?;
    log::info!(
        "Loaded {} alignment blocks from {}",
        set.len(),
        args.input.display()
    );
    set.write_maf(&args.output)?;
    log::info!("Wrote sorted MAF to {}", args.output.display());
    Ok(())
}
