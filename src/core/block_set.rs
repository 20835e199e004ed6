use crate::{
    core::{
        block::{BlockRef, SetId},
        codec::{block_to_record, record_to_block},
        genome::{Genome, Genomes},
        range_index::RangeIndex,
    },
    error::MafxError,
    io::{maf_reader::MafReader, maf_writer::MafWriter},
    utils::util::Result,
};
use std::{
    cell::RefCell,
    collections::HashSet,
    fs::File,
    path::Path,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_SET_ID: AtomicU64 = AtomicU64::new(1);

/// Sort key imposing the deterministic output order: the root (last)
/// component's genome name, sequence name and chromosome range. Derived at
/// write time, never stored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RootOrderKey {
    pub genome: String,
    pub seq: String,
    pub start: i64,
    pub end: i64,
}

impl RootOrderKey {
    pub fn for_block(block: &BlockRef) -> Result<Self> {
        let block = block.borrow();
        let root = block
            .root_comp()
            .ok_or_else(|| crate::mafx_error!("Cannot order a block with no components"))?;
        Ok(RootOrderKey {
            genome: root.seq.genome().name.clone(),
            seq: root.seq.name.clone(),
            start: root.chrom_start(),
            end: root.chrom_end(),
        })
    }
}

/// A set of alignment blocks anchored to one reference genome: an unordered,
/// identity-keyed collection plus a lazily built range index over the
/// reference-genome components.
///
/// Single-threaded by design (`Rc`/`RefCell` interior); callers must
/// serialize access, including the lazy index build on first overlap query.
pub struct BlockSet {
    genomes: Rc<Genomes>,
    ref_genome: Rc<Genome>,
    id: SetId,
    blocks: HashSet<BlockRef>,
    range_index: RefCell<Option<RangeIndex>>,
}

impl BlockSet {
    pub fn new(genomes: Rc<Genomes>, ref_genome: Rc<Genome>) -> Self {
        BlockSet {
            genomes,
            ref_genome,
            id: SetId(NEXT_SET_ID.fetch_add(1, Ordering::Relaxed)),
            blocks: HashSet::new(),
            range_index: RefCell::new(None),
        }
    }

    /// Load a MAF file into a new set, decoding records in file order.
    /// `default_branch_length` seeds inferred trees for treeless records.
    pub fn from_maf(
        genomes: Rc<Genomes>,
        ref_genome: Rc<Genome>,
        path: &Path,
        default_branch_length: f64,
    ) -> Result<Self> {
        let mut set = BlockSet::new(genomes, ref_genome);
        let mut reader = MafReader::open(path)?;
        while let Some(record) = reader.next_record()? {
            let block = record_to_block(
                &set.genomes,
                &set.ref_genome,
                &record,
                default_branch_length,
            )?;
            set.add_block(block)?;
        }
        log::debug!(
            "Loaded {} blocks from {} (reference genome {})",
            set.blocks.len(),
            path.display(),
            set.ref_genome.name
        );
        Ok(set)
    }

    pub fn genomes(&self) -> &Rc<Genomes> {
        &self.genomes
    }

    pub fn ref_genome(&self) -> &Rc<Genome> {
        &self.ref_genome
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Take ownership of an unowned block. Adding discards any built range
    /// index; the next overlap query rebuilds it over the full collection.
    pub fn add_block(&mut self, block: BlockRef) -> Result<()> {
        if block.borrow().owner().is_some() {
            return Err(MafxError::BlockAlreadyOwned);
        }
        block.borrow_mut().set_owner(Some(self.id));
        self.blocks.insert(block);
        self.range_index.replace(None);
        Ok(())
    }

    /// Release a block owned by this set: tombstone its index slots if the
    /// index has been built, drop it from the collection, clear its owner
    /// link. The caller keeps the handle.
    pub fn remove_block(&mut self, block: &BlockRef) -> Result<()> {
        if block.borrow().owner() != Some(self.id) {
            return Err(MafxError::BlockNotOwned);
        }
        if let Some(index) = self.range_index.borrow().as_ref() {
            index.tombstone(&self.ref_genome, block)?;
        }
        self.blocks.remove(block);
        block.borrow_mut().set_owner(None);
        Ok(())
    }

    /// Remove a block and consume the handle.
    pub fn delete_block(&mut self, block: BlockRef) -> Result<()> {
        self.remove_block(&block)?;
        drop(block);
        Ok(())
    }

    /// All live blocks with a reference-genome component on `seq_name`
    /// overlapping the half-open range `[start, end)`. Builds the range index
    /// on first use; tombstoned slots are filtered out, duplicates collapse
    /// into the set.
    pub fn get_overlapping(&self, seq_name: &str, start: i64, end: i64) -> HashSet<BlockRef> {
        if self.range_index.borrow().is_none() {
            self.range_index
                .replace(Some(RangeIndex::build(self.blocks.iter(), &self.ref_genome)));
        }
        let mut overlapping = HashSet::new();
        if let Some(index) = self.range_index.borrow().as_ref() {
            for slot in index.overlap(seq_name, start, end) {
                if let Some(block) = slot.borrow().as_ref() {
                    overlapping.insert(block.clone());
                }
            }
        }
        overlapping
    }

    /// Unordered traversal of the collection. Do not add or remove blocks
    /// while iterating.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockRef> {
        self.blocks.iter()
    }

    /// Reset every block's transient done flag, for external multi-pass
    /// algorithms.
    pub fn clear_done_flags(&self) {
        for block in &self.blocks {
            block.borrow_mut().set_done(false);
        }
    }

    /// Write the set as a MAF file, blocks in RootOrderKey order so repeated
    /// writes of the same logical set are byte-identical regardless of
    /// insertion order.
    pub fn write_maf(&self, path: &Path) -> Result<()> {
        let mut ordered: Vec<(RootOrderKey, &BlockRef)> = self
            .blocks
            .iter()
            .map(|block| Ok((RootOrderKey::for_block(block)?, block)))
            .collect::<Result<_>>()?;
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        let file = File::create(path).map_err(|error| {
            crate::mafx_error!("Failed to create file {}: {error}", path.display())
        })?;
        let mut writer = MafWriter::new(file);
        writer.write_start()?;
        for (_, block) in &ordered {
            writer.write_record(&block_to_record(&block.borrow())?)?;
        }
        writer.write_end()?;
        log::debug!("Wrote {} blocks to {}", ordered.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        block::test_utils::{make_block, make_comp},
        strand::Strand,
    };

    fn new_set() -> (Rc<Genomes>, Rc<Genome>, BlockSet) {
        let genomes = Rc::new(Genomes::new());
        let ref_genome = genomes.obtain_genome("hg38");
        let set = BlockSet::new(genomes.clone(), ref_genome.clone());
        (genomes, ref_genome, set)
    }

    fn chr1_block(genomes: &Genomes, start: i64, end: i64) -> BlockRef {
        make_block(vec![make_comp(
            genomes,
            "hg38",
            "chr1",
            10_000,
            Strand::Forward,
            start,
            end,
            "A",
        )])
    }

    #[test]
    fn test_overlap_and_delete_scenario() {
        let (genomes, _, mut set) = new_set();
        let a = chr1_block(&genomes, 100, 200);
        let b = chr1_block(&genomes, 500, 600);
        set.add_block(a.clone()).unwrap();
        set.add_block(b.clone()).unwrap();

        let hits = set.get_overlapping("chr1", 150, 160);
        assert_eq!(hits.len(), 1);
        assert!(hits.contains(&a));

        set.delete_block(a).unwrap();
        assert!(set.get_overlapping("chr1", 150, 160).is_empty());

        let hits = set.get_overlapping("chr1", 550, 560);
        assert_eq!(hits.len(), 1);
        assert!(hits.contains(&b));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_overlap_is_half_open() {
        let (genomes, _, mut set) = new_set();
        let a = chr1_block(&genomes, 100, 200);
        set.add_block(a.clone()).unwrap();
        assert!(set.get_overlapping("chr1", 200, 300).is_empty());
        assert!(set.get_overlapping("chr1", 0, 100).is_empty());
        assert_eq!(set.get_overlapping("chr1", 199, 200).len(), 1);
        assert_eq!(set.get_overlapping("chr1", 99, 100).len(), 0);
        assert_eq!(set.get_overlapping("chr1", 100, 101).len(), 1);
    }

    #[test]
    fn test_ownership_invariants() {
        let (genomes, ref_genome, mut set) = new_set();
        let a = chr1_block(&genomes, 100, 200);
        set.add_block(a.clone()).unwrap();

        // A block cannot be owned twice, by this set or any other.
        assert!(matches!(
            set.add_block(a.clone()),
            Err(MafxError::BlockAlreadyOwned)
        ));
        let mut other = BlockSet::new(genomes.clone(), ref_genome.clone());
        assert!(matches!(
            other.add_block(a.clone()),
            Err(MafxError::BlockAlreadyOwned)
        ));

        // Removal from a set that does not own the block is an error.
        let unowned = chr1_block(&genomes, 300, 400);
        assert!(matches!(
            set.remove_block(&unowned),
            Err(MafxError::BlockNotOwned)
        ));
        assert!(matches!(
            other.remove_block(&a),
            Err(MafxError::BlockNotOwned)
        ));

        // After removal the block can move to the other set.
        set.remove_block(&a).unwrap();
        assert_eq!(a.borrow().owner(), None);
        other.add_block(a.clone()).unwrap();
        assert_eq!(a.borrow().owner(), other.blocks.iter().next().unwrap().borrow().owner());
    }

    #[test]
    fn test_add_after_query_invalidates_index() {
        let (genomes, _, mut set) = new_set();
        let a = chr1_block(&genomes, 100, 200);
        set.add_block(a).unwrap();
        assert_eq!(set.get_overlapping("chr1", 150, 160).len(), 1);

        // The index was built by the query above; adding must not leave it
        // stale.
        let b = chr1_block(&genomes, 150, 250);
        set.add_block(b.clone()).unwrap();
        let hits = set.get_overlapping("chr1", 150, 160);
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(&b));
    }

    #[test]
    fn test_remove_before_index_built() {
        let (genomes, _, mut set) = new_set();
        let a = chr1_block(&genomes, 100, 200);
        set.add_block(a.clone()).unwrap();
        // No query yet, so there is no index to tombstone.
        set.remove_block(&a).unwrap();
        assert!(set.is_empty());
        assert!(set.get_overlapping("chr1", 100, 200).is_empty());
    }

    #[test]
    fn test_get_overlapping_deduplicates() {
        let (genomes, _, mut set) = new_set();
        // One block with two reference components in the queried range.
        let a = make_block(vec![
            make_comp(&genomes, "hg38", "chr1", 10_000, Strand::Forward, 100, 101, "A"),
            make_comp(&genomes, "hg38", "chr1", 10_000, Strand::Forward, 150, 151, "A"),
        ]);
        set.add_block(a.clone()).unwrap();
        let hits = set.get_overlapping("chr1", 0, 1000);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_reverse_strand_component_indexed_by_chrom_range() {
        let (genomes, _, mut set) = new_set();
        // Reverse strand [100, 200) on a 10_000 base sequence maps to
        // chromosome range [9800, 9900).
        let a = make_block(vec![make_comp(
            &genomes,
            "hg38",
            "chr1",
            10_000,
            Strand::Reverse,
            100,
            200,
            "A",
        )]);
        set.add_block(a.clone()).unwrap();
        assert_eq!(set.get_overlapping("chr1", 9850, 9860).len(), 1);
        assert!(set.get_overlapping("chr1", 100, 200).is_empty());
    }

    #[test]
    fn test_clear_done_flags() {
        let (genomes, _, mut set) = new_set();
        let a = chr1_block(&genomes, 100, 200);
        let b = chr1_block(&genomes, 500, 600);
        a.borrow_mut().set_done(true);
        set.add_block(a.clone()).unwrap();
        set.add_block(b.clone()).unwrap();

        set.clear_done_flags();
        assert!(!a.borrow().done());
        assert!(!b.borrow().done());

        // Idempotent.
        set.clear_done_flags();
        assert!(!a.borrow().done());
    }

    #[test]
    fn test_root_order_key() {
        let (genomes, _, _) = new_set();
        let a = chr1_block(&genomes, 100, 200);
        let key = RootOrderKey::for_block(&a).unwrap();
        assert_eq!(key.genome, "hg38");
        assert_eq!(key.seq, "chr1");
        assert_eq!(key.start, 100);
        assert_eq!(key.end, 200);

        let b = chr1_block(&genomes, 100, 300);
        assert!(RootOrderKey::for_block(&a).unwrap() < RootOrderKey::for_block(&b).unwrap());
    }
}
