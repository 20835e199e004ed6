use crate::{
    core::{
        block::{Block, BlockRef, Component},
        genome::{Genome, Genomes},
        tree::MafTree,
    },
    error::MafxError,
    io::maf_reader::{MafComp, MafRecord},
    utils::util::Result,
};
use std::rc::Rc;

/// Convert one MAF record into a block. Components are resolved against the
/// genome catalog, appended in file order, then canonically reordered; the
/// reference-relative location attribute is computed last. Records without a
/// tree annotation get one inferred with `default_branch_length`.
pub fn record_to_block(
    genomes: &Genomes,
    ref_genome: &Rc<Genome>,
    record: &MafRecord,
    default_branch_length: f64,
) -> Result<BlockRef> {
    let tree = match &record.tree {
        Some(text) => MafTree::parse(text)?,
        None => {
            let labels: Vec<String> = record
                .components
                .iter()
                .map(|c| c.src.clone())
                .collect();
            MafTree::infer(&labels, default_branch_length)?
        }
    };
    let mut block = Block::new(Some(tree));
    for comp in &record.components {
        block.add_comp(record_comp_to_component(genomes, comp)?)?;
    }
    block.sort_comps();
    block.set_ref_location(ref_genome);
    Ok(BlockRef::new(block))
}

fn record_comp_to_component(genomes: &Genomes, comp: &MafComp) -> Result<Component> {
    let (org, seq_name) = comp
        .src
        .split_once('.')
        .ok_or_else(|| MafxError::MissingSourceOrg {
            src: comp.src.clone(),
        })?;
    let seq = genomes.obtain_seq(org, seq_name, comp.src_size)?;
    Component::new(
        seq,
        comp.strand,
        comp.start,
        comp.start + comp.size,
        comp.text.clone(),
    )
}

/// Convert a block back into a MAF record, in the block's current component
/// order.
pub fn block_to_record(block: &Block) -> Result<MafRecord> {
    if block.comps().is_empty() {
        return Err(crate::mafx_error!("Cannot export a block with no components"));
    }
    let components = block
        .comps()
        .iter()
        .map(|comp| MafComp {
            src: comp.seq.org_seq_name(),
            start: comp.start,
            size: comp.size(),
            strand: comp.strand,
            src_size: comp.seq.size,
            text: comp.text.clone(),
        })
        .collect();
    Ok(MafRecord {
        score: None,
        tree: block.tree().map(MafTree::format),
        components,
    })
}
