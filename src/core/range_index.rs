use crate::{
    core::{
        block::BlockRef,
        containers::interval_tree::{Interval, IntervalTree},
        genome::Genome,
    },
    error::MafxError,
    utils::util::Result,
};
use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// A mutable cell registered in the interval index for one reference-genome
/// component. Removal tombstones the slot (clears it to `None`) because the
/// interval tree cannot physically delete; overlap queries filter the empty
/// slots out.
pub type Slot = Rc<RefCell<Option<BlockRef>>>;

/// Per-sequence-name interval index over the reference-genome components of a
/// block collection. Built lazily by the owning set, in one pass; afterwards
/// it only answers overlap queries and tombstones removals.
pub struct RangeIndex {
    trees: HashMap<String, IntervalTree<i64, Slot>>,
}

impl RangeIndex {
    /// Index every component of every block whose genome is (by reference
    /// identity) the reference genome, keyed by the component's sequence name
    /// and forward-strand chromosome range.
    pub fn build<'a>(blocks: impl Iterator<Item = &'a BlockRef>, ref_genome: &Rc<Genome>) -> Self {
        let mut per_seq: HashMap<String, Vec<Interval<i64, Slot>>> = HashMap::new();
        for block in blocks {
            for comp in block.borrow().comps() {
                if Rc::ptr_eq(&comp.seq.genome(), ref_genome) {
                    let slot: Slot = Rc::new(RefCell::new(Some(block.clone())));
                    per_seq.entry(comp.seq.name.clone()).or_default().push(
                        Interval::new(comp.chrom_start(), comp.chrom_end(), slot),
                    );
                }
            }
        }
        let trees = per_seq
            .into_iter()
            .map(|(seq_name, intervals)| (seq_name, IntervalTree::new(intervals)))
            .collect();
        RangeIndex { trees }
    }

    /// All slots (live or tombstoned) overlapping the half-open range on the
    /// named sequence. Unindexed sequence names yield nothing.
    pub fn overlap(&self, seq_name: &str, start: i64, end: i64) -> Vec<Slot> {
        let mut slots = Vec::new();
        if let Some(tree) = self.trees.get(seq_name) {
            tree.visit_overlapping(start, end, &mut |interval| {
                slots.push(interval.value.clone());
            });
        }
        slots
    }

    /// Clear the slots registered for this block's reference-genome
    /// components: one live slot per component, located by re-querying at the
    /// component's own coordinates. A previously indexed component without a
    /// live slot means the index and the collection are out of sync.
    pub fn tombstone(&self, ref_genome: &Rc<Genome>, block: &BlockRef) -> Result<()> {
        for comp in block.borrow().comps() {
            if !Rc::ptr_eq(&comp.seq.genome(), ref_genome) {
                continue;
            }
            let mut found = false;
            for slot in self.overlap(&comp.seq.name, comp.chrom_start(), comp.chrom_end()) {
                let holds_block = slot.borrow().as_ref() == Some(block);
                if holds_block {
                    slot.replace(None);
                    found = true;
                    break;
                }
            }
            if !found {
                return Err(MafxError::IndexSlotMissing {
                    comp: comp.describe(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        block::test_utils::{make_block, make_comp},
        genome::Genomes,
        strand::Strand,
    };

    fn live_blocks(slots: &[Slot]) -> Vec<BlockRef> {
        slots
            .iter()
            .filter_map(|slot| slot.borrow().clone())
            .collect()
    }

    #[test]
    fn test_build_and_overlap() {
        let genomes = Genomes::new();
        let ref_genome = genomes.obtain_genome("hg38");
        let a = make_block(vec![
            make_comp(&genomes, "hg38", "chr1", 1000, Strand::Forward, 100, 104, "ACGT"),
            make_comp(&genomes, "mm39", "chr3", 1000, Strand::Forward, 0, 4, "ACGT"),
        ]);
        let b = make_block(vec![make_comp(
            &genomes, "hg38", "chr2", 1000, Strand::Forward, 100, 104, "ACGT",
        )]);
        let blocks = vec![a.clone(), b.clone()];
        let index = RangeIndex::build(blocks.iter(), &ref_genome);

        let hits = live_blocks(&index.overlap("chr1", 102, 103));
        assert_eq!(hits, vec![a.clone()]);

        // The non-reference mm39 component is not indexed.
        assert!(index.overlap("chr3", 0, 1000).is_empty());
        // Nor is an unknown sequence name.
        assert!(index.overlap("chrUn", 0, 1000).is_empty());

        let hits = live_blocks(&index.overlap("chr2", 0, 1000));
        assert_eq!(hits, vec![b]);
    }

    #[test]
    fn test_tombstone_hides_block() {
        let genomes = Genomes::new();
        let ref_genome = genomes.obtain_genome("hg38");
        let a = make_block(vec![make_comp(
            &genomes, "hg38", "chr1", 1000, Strand::Forward, 100, 200, "A",
        )]);
        let b = make_block(vec![make_comp(
            &genomes, "hg38", "chr1", 1000, Strand::Forward, 150, 250, "A",
        )]);
        let blocks = vec![a.clone(), b.clone()];
        let index = RangeIndex::build(blocks.iter(), &ref_genome);

        index.tombstone(&ref_genome, &a).unwrap();
        let hits = live_blocks(&index.overlap("chr1", 150, 160));
        assert_eq!(hits, vec![b]);

        // Tombstoning again cannot find a live slot.
        let err = index.tombstone(&ref_genome, &a).unwrap_err();
        assert!(matches!(err, MafxError::IndexSlotMissing { .. }));
    }

    #[test]
    fn test_tombstone_clears_one_slot_per_component() {
        let genomes = Genomes::new();
        let ref_genome = genomes.obtain_genome("hg38");
        // Two identical components in one block register two slots; each
        // tombstone pass must clear exactly one.
        let a = make_block(vec![
            make_comp(&genomes, "hg38", "chr1", 1000, Strand::Forward, 100, 104, "ACGT"),
            make_comp(&genomes, "hg38", "chr1", 1000, Strand::Forward, 100, 104, "ACGT"),
        ]);
        let blocks = vec![a.clone()];
        let index = RangeIndex::build(blocks.iter(), &ref_genome);
        assert_eq!(index.overlap("chr1", 100, 104).len(), 2);

        index.tombstone(&ref_genome, &a).unwrap();
        assert!(live_blocks(&index.overlap("chr1", 100, 104)).is_empty());
    }

    #[test]
    fn test_tombstone_ignores_non_reference_components() {
        let genomes = Genomes::new();
        let ref_genome = genomes.obtain_genome("hg38");
        let a = make_block(vec![make_comp(
            &genomes, "mm39", "chr3", 1000, Strand::Forward, 0, 4, "ACGT",
        )]);
        let blocks = vec![a.clone()];
        let index = RangeIndex::build(blocks.iter(), &ref_genome);
        index.tombstone(&ref_genome, &a).unwrap();
    }
}
