use crate::{error::MafxError, utils::util::Result};
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

/// One sequence (chromosome, scaffold, contig) of a genome. Obtained through
/// the [`Genomes`] catalog so that repeated lookups of the same
/// organism/sequence pair yield the same shared object.
pub struct Seq {
    genome: Weak<Genome>,
    pub name: String,
    pub size: i64,
}

impl Seq {
    /// Owning genome.
    ///
    /// # Panics
    ///
    /// Panics if the catalog that produced this sequence has been dropped.
    /// Holders of a `Seq` must keep the [`Genomes`] catalog alive, as
    /// `BlockSet` does through its `Rc<Genomes>`.
    pub fn genome(&self) -> Rc<Genome> {
        self.genome
            .upgrade()
            .expect("genome catalog dropped while sequences are still in use")
    }

    /// `org.seq` form used as the MAF source field.
    pub fn org_seq_name(&self) -> String {
        format!("{}.{}", self.genome().name, self.name)
    }
}

impl fmt::Debug for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seq({}, size={})", self.org_seq_name(), self.size)
    }
}

/// One organism: a named collection of sequences. Genome identity is by
/// reference (`Rc::ptr_eq`), never by name comparison.
pub struct Genome {
    pub name: String,
    seqs: RefCell<HashMap<String, Rc<Seq>>>,
}

impl Genome {
    fn new(name: &str) -> Self {
        Genome {
            name: name.to_string(),
            seqs: RefCell::new(HashMap::new()),
        }
    }
}

impl fmt::Debug for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genome({}, {} seqs)", self.name, self.seqs.borrow().len())
    }
}

/// Catalog resolving organism and sequence names to shared objects, created
/// on demand as MAF components are imported. Sequences hold their genome
/// weakly, so the catalog must outlive every `Seq` it hands out.
#[derive(Debug, Default)]
pub struct Genomes {
    genomes: RefCell<HashMap<String, Rc<Genome>>>,
}

impl Genomes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a genome by organism name, creating it if absent.
    pub fn obtain_genome(&self, name: &str) -> Rc<Genome> {
        self.genomes
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| Rc::new(Genome::new(name)))
            .clone()
    }

    /// Look up a sequence, creating genome and sequence entries if absent.
    /// A sequence already cataloged with a different total length is an
    /// error: conflicting srcSize fields must never be silently accepted.
    pub fn obtain_seq(&self, org: &str, seq_name: &str, size: i64) -> Result<Rc<Seq>> {
        let genome = self.obtain_genome(org);
        let mut seqs = genome.seqs.borrow_mut();
        if let Some(seq) = seqs.get(seq_name) {
            if seq.size != size {
                return Err(MafxError::SeqSizeConflict {
                    org: org.to_string(),
                    name: seq_name.to_string(),
                    cataloged: seq.size,
                    got: size,
                });
            }
            return Ok(seq.clone());
        }
        let seq = Rc::new(Seq {
            genome: Rc::downgrade(&genome),
            name: seq_name.to_string(),
            size,
        });
        seqs.insert(seq_name.to_string(), seq.clone());
        Ok(seq)
    }
}
