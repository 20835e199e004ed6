use crate::{
    cli::OverlapArgs,
    core::{block_set::{BlockSet, RootOrderKey}, genome::Genomes},
    utils::util::Result,
};
use std::{
    io::{self, Write},
    rc::Rc,
};

/// Print the blocks whose reference-genome components overlap a region, in
/// deterministic root order.
pub fn overlap(args: OverlapArgs) -> Result<()> {
    let genomes = Rc::new(Genomes::new());
    let ref_genome = genomes.obtain_genome(&args.ref_genome);
    let set = BlockSet::from_maf(
        genomes.clone(),
        ref_genome,
        &args.input,
        args.branch_length,
    )?;

    let region = &args.region;
    let hits = set.get_overlapping(&region.seq_name, region.start, region.end);
    log::info!(
        "{} of {} blocks overlap {}:{}-{}",
        hits.len(),
        set.len(),
        region.seq_name,
        region.start,
        region.end
    );

    let mut ordered: Vec<_> = hits
        .iter()
        .map(|block| Ok((RootOrderKey::for_block(block)?, block)))
        .collect::<Result<_>>()?;
    ordered.sort_by(|a: &(RootOrderKey, _), b| a.0.cmp(&b.0));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (key, block) in &ordered {
        let block = block.borrow();
        writeln!(
            out,
            "{}.{}:{}-{}\twidth={}\tcomps={}",
            key.genome,
            key.seq,
            key.start,
            key.end,
            block.aln_width(),
            block.comps().len()
        )?;
    }
    Ok(())
}
