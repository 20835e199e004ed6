use crate::{
    core::{genome::Genome, genome::Seq, strand::Strand, tree::MafTree},
    utils::util::Result,
};
use std::{
    cell::{Ref, RefCell, RefMut},
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

/// Opaque handle identifying the owning [`BlockSet`](crate::core::block_set::BlockSet).
/// Stored on a block instead of a back-pointer so that double ownership and
/// foreign removal can be checked without aliasing the set itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetId(pub(crate) u64);

/// One sequence's participation in an alignment block: its source sequence,
/// strand, half-open strand-relative range `[start, end)`, and aligned text.
pub struct Component {
    pub seq: Rc<Seq>,
    pub strand: Strand,
    pub start: i64,
    pub end: i64,
    pub text: String,
}

impl Component {
    pub fn new(seq: Rc<Seq>, strand: Strand, start: i64, end: i64, text: String) -> Result<Self> {
        if start < 0 || start > end || end > seq.size {
            return Err(crate::mafx_error!(
                "Component range [{}, {}) out of bounds for {} (size {})",
                start,
                end,
                seq.org_seq_name(),
                seq.size
            ));
        }
        Ok(Component {
            seq,
            strand,
            start,
            end,
            text,
        })
    }

    /// Start on the forward strand of the chromosome. Reverse-strand MAF
    /// coordinates count from the far end of the sequence.
    pub fn chrom_start(&self) -> i64 {
        match self.strand {
            Strand::Forward => self.start,
            Strand::Reverse => self.seq.size - self.end,
        }
    }

    pub fn chrom_end(&self) -> i64 {
        match self.strand {
            Strand::Forward => self.end,
            Strand::Reverse => self.seq.size - self.start,
        }
    }

    /// Number of source bases covered (gaps in the text excluded).
    pub fn size(&self) -> i64 {
        self.end - self.start
    }

    pub fn width(&self) -> usize {
        self.text.len()
    }

    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.chrom_start() < end && self.chrom_end() > start
    }

    pub fn describe(&self) -> String {
        format!(
            "{}:{}-{}({})",
            self.seq.org_seq_name(),
            self.chrom_start(),
            self.chrom_end(),
            self.strand
        )
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.describe())
    }
}

/// Where a block's reference-genome components sit on their sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefLocation {
    Unknown,
    NoRef,
    Internal,
    SeqStart,
    SeqEnd,
    WholeSeq,
}

/// One multiple-sequence-alignment block: an ordered list of components
/// sharing alignment columns, an optional tree, and the column width. The
/// `done` flag is transient state for external multi-pass algorithms.
pub struct Block {
    comps: Vec<Component>,
    tree: Option<MafTree>,
    aln_width: usize,
    ref_location: RefLocation,
    done: bool,
    owner: Option<SetId>,
}

impl Block {
    pub fn new(tree: Option<MafTree>) -> Self {
        Block {
            comps: Vec::new(),
            tree,
            aln_width: 0,
            ref_location: RefLocation::Unknown,
            done: false,
            owner: None,
        }
    }

    /// Append a component. The first component fixes the alignment width;
    /// later components must match it.
    pub fn add_comp(&mut self, comp: Component) -> Result<()> {
        if self.comps.is_empty() {
            self.aln_width = comp.width();
        } else if comp.width() != self.aln_width {
            return Err(crate::mafx_error!(
                "Component {} has width {}, block width is {}",
                comp.describe(),
                comp.width(),
                self.aln_width
            ));
        }
        self.comps.push(comp);
        Ok(())
    }

    pub fn comps(&self) -> &[Component] {
        &self.comps
    }

    /// The root component: the last in canonical order, used as the
    /// deterministic sort key when writing.
    pub fn root_comp(&self) -> Option<&Component> {
        self.comps.last()
    }

    pub fn tree(&self) -> Option<&MafTree> {
        self.tree.as_ref()
    }

    pub fn aln_width(&self) -> usize {
        self.aln_width
    }

    /// Canonical component order: sorted by (genome, sequence, chrom range),
    /// with the tree-root component moved last.
    pub fn sort_comps(&mut self) {
        self.comps.sort_by_cached_key(|c| {
            (
                c.seq.genome().name.clone(),
                c.seq.name.clone(),
                c.chrom_start(),
                c.chrom_end(),
            )
        });
        if let Some(root_label) = self.tree.as_ref().map(|t| t.root_label().to_string()) {
            if let Some(pos) = self
                .comps
                .iter()
                .position(|c| c.seq.org_seq_name() == root_label)
            {
                let root = self.comps.remove(pos);
                self.comps.push(root);
            }
        }
    }

    /// Compute the reference-relative location attribute against the given
    /// reference genome.
    pub fn set_ref_location(&mut self, ref_genome: &Rc<Genome>) {
        let mut span: Option<(i64, i64, i64)> = None; // (start, end, seq size)
        for comp in &self.comps {
            if Rc::ptr_eq(&comp.seq.genome(), ref_genome) {
                let (start, end) = (comp.chrom_start(), comp.chrom_end());
                span = Some(match span {
                    None => (start, end, comp.seq.size),
                    Some((s, e, size)) => (s.min(start), e.max(end), size),
                });
            }
        }
        self.ref_location = match span {
            None => RefLocation::NoRef,
            Some((start, end, size)) => match (start == 0, end == size) {
                (true, true) => RefLocation::WholeSeq,
                (true, false) => RefLocation::SeqStart,
                (false, true) => RefLocation::SeqEnd,
                (false, false) => RefLocation::Internal,
            },
        };
    }

    pub fn ref_location(&self) -> RefLocation {
        self.ref_location
    }

    pub fn done(&self) -> bool {
        self.done
    }

    pub fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    pub fn owner(&self) -> Option<SetId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<SetId>) {
        self.owner = owner;
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block(width={}, comps=[{}])",
            self.aln_width,
            self.comps
                .iter()
                .map(Component::describe)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// Shared handle to a block. Equality and hashing are by identity, never by
/// content: a block set is unique by identity, and index slots must point at
/// the exact block they were registered for.
#[derive(Clone)]
pub struct BlockRef(Rc<RefCell<Block>>);

impl BlockRef {
    pub fn new(block: Block) -> Self {
        BlockRef(Rc::new(RefCell::new(block)))
    }

    pub fn borrow(&self) -> Ref<'_, Block> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Block> {
        self.0.borrow_mut()
    }

    fn as_ptr(&self) -> *const RefCell<Block> {
        Rc::as_ptr(&self.0)
    }
}

impl PartialEq for BlockRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for BlockRef {}

impl Hash for BlockRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ptr().hash(state);
    }
}

impl fmt::Debug for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockRef({:?})", self.0.borrow())
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use crate::core::genome::Genomes;

    pub fn make_comp(
        genomes: &Genomes,
        org: &str,
        seq_name: &str,
        size: i64,
        strand: Strand,
        start: i64,
        end: i64,
        text: &str,
    ) -> Component {
        let seq = genomes.obtain_seq(org, seq_name, size).unwrap();
        Component::new(seq, strand, start, end, text.to_string()).unwrap()
    }

    pub fn make_block(comps: Vec<Component>) -> BlockRef {
        let mut block = Block::new(None);
        for comp in comps {
            block.add_comp(comp).unwrap();
        }
        BlockRef::new(block)
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;
    use crate::core::genome::Genomes;

    #[test]
    fn test_component_bounds_checked() {
        let genomes = Genomes::new();
        let seq = genomes.obtain_seq("hg38", "chr1", 100).unwrap();
        assert!(Component::new(seq.clone(), Strand::Forward, 10, 5, "A".into()).is_err());
        assert!(Component::new(seq.clone(), Strand::Forward, 0, 101, "A".into()).is_err());
        assert!(Component::new(seq, Strand::Forward, 0, 100, "A".into()).is_ok());
    }

    #[test]
    fn test_reverse_strand_chrom_coordinates() {
        let genomes = Genomes::new();
        let comp = make_comp(&genomes, "hg38", "chr1", 1000, Strand::Reverse, 100, 200, "ACGT");
        assert_eq!(comp.chrom_start(), 800);
        assert_eq!(comp.chrom_end(), 900);
        assert!(comp.overlaps(850, 860));
        assert!(!comp.overlaps(100, 200));
    }

    #[test]
    fn test_block_width_mismatch() {
        let genomes = Genomes::new();
        let mut block = Block::new(None);
        block
            .add_comp(make_comp(&genomes, "a", "s1", 100, Strand::Forward, 0, 4, "ACGT"))
            .unwrap();
        let err = block
            .add_comp(make_comp(&genomes, "b", "s2", 100, Strand::Forward, 0, 2, "AC"))
            .unwrap_err();
        assert!(err.to_string().contains("width"));
        assert_eq!(block.aln_width(), 4);
    }

    #[test]
    fn test_sort_comps_root_last() {
        let genomes = Genomes::new();
        let tree = MafTree::parse("(mm39.chr3:0.1)hg38.chr1;").unwrap();
        let mut block = Block::new(Some(tree));
        block
            .add_comp(make_comp(&genomes, "hg38", "chr1", 1000, Strand::Forward, 10, 14, "ACGT"))
            .unwrap();
        block
            .add_comp(make_comp(&genomes, "mm39", "chr3", 1000, Strand::Forward, 20, 24, "ACGT"))
            .unwrap();
        block.sort_comps();
        // hg38 sorts before mm39, but the tree root goes last.
        assert_eq!(block.root_comp().unwrap().seq.org_seq_name(), "hg38.chr1");
        assert_eq!(block.comps()[0].seq.org_seq_name(), "mm39.chr3");
    }

    #[test]
    fn test_ref_location() {
        let genomes = Genomes::new();
        let ref_genome = genomes.obtain_genome("hg38");

        let blk = make_block(vec![make_comp(
            &genomes, "hg38", "chr1", 1000, Strand::Forward, 100, 104, "ACGT",
        )]);
        blk.borrow_mut().set_ref_location(&ref_genome);
        assert_eq!(blk.borrow().ref_location(), RefLocation::Internal);

        let blk = make_block(vec![make_comp(
            &genomes, "hg38", "chr2", 4, Strand::Forward, 0, 4, "ACGT",
        )]);
        blk.borrow_mut().set_ref_location(&ref_genome);
        assert_eq!(blk.borrow().ref_location(), RefLocation::WholeSeq);

        let blk = make_block(vec![make_comp(
            &genomes, "mm39", "chr3", 1000, Strand::Forward, 0, 4, "ACGT",
        )]);
        blk.borrow_mut().set_ref_location(&ref_genome);
        assert_eq!(blk.borrow().ref_location(), RefLocation::NoRef);
    }

    #[test]
    fn test_block_ref_identity() {
        let genomes = Genomes::new();
        let a = make_block(vec![make_comp(
            &genomes, "hg38", "chr1", 1000, Strand::Forward, 0, 4, "ACGT",
        )]);
        let b = a.clone();
        let c = make_block(vec![make_comp(
            &genomes, "hg38", "chr1", 1000, Strand::Forward, 0, 4, "ACGT",
        )]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
