use crate::{core::strand::Strand, io::readers::open_maf_reader, utils::util::Result};
use std::{io::BufRead, path::Path};

/// One `s` line of a MAF record, exactly as it appears in the file:
/// strand-relative start and size, total source-sequence length, and the
/// aligned text.
#[derive(Debug, Clone, PartialEq)]
pub struct MafComp {
    pub src: String,
    pub start: i64,
    pub size: i64,
    pub strand: Strand,
    pub src_size: i64,
    pub text: String,
}

/// One alignment paragraph of a MAF file: the `a` line attributes that this
/// core cares about plus the component list in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MafRecord {
    pub score: Option<f64>,
    pub tree: Option<String>,
    pub components: Vec<MafComp>,
}

impl MafRecord {
    /// Alignment column count, shared by every component text.
    pub fn text_width(&self) -> usize {
        self.components.first().map_or(0, |c| c.text.len())
    }
}

/// Sequential record-by-record MAF parser. Tolerates `i`, `e` and `q` lines
/// and comments; validates structure (field counts, numeric fields, ranges,
/// one shared text width per record) but never alignment column content.
pub struct MafReader<R: BufRead> {
    reader: R,
    line_number: usize,
}

impl MafReader<std::io::BufReader<Box<dyn std::io::Read>>> {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(MafReader::new(open_maf_reader(path)?))
    }
}

impl<R: BufRead> MafReader<R> {
    pub fn new(reader: R) -> Self {
        MafReader {
            reader,
            line_number: 0,
        }
    }

    /// Next record, or `None` at end of file.
    pub fn next_record(&mut self) -> Result<Option<MafRecord>> {
        let mut record: Option<MafRecord> = None;
        let mut line = String::new();
        loop {
            line.clear();
            let n = self.reader.read_line(&mut line)?;
            if n == 0 {
                return self.finish_record(record);
            }
            self.line_number += 1;
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                if record.is_some() {
                    return self.finish_record(record);
                }
                continue;
            }
            if trimmed.starts_with('#') {
                continue;
            }
            let mut fields = trimmed.split_whitespace();
            match fields.next() {
                Some("a") => {
                    if record.is_some() {
                        return Err(self.line_error("'a' line inside an alignment record"));
                    }
                    record = Some(self.parse_a_line(trimmed)?);
                }
                Some("s") => {
                    let comp = self.parse_s_line(trimmed)?;
                    match record.as_mut() {
                        Some(record) => record.components.push(comp),
                        None => return Err(self.line_error("'s' line outside an 'a' paragraph")),
                    }
                }
                // Synteny, empty-region and quality lines are not modeled.
                Some("i") | Some("e") | Some("q") => {}
                _ => return Err(self.line_error(&format!("Unrecognized MAF line: {}", trimmed))),
            }
        }
    }

    fn finish_record(&self, record: Option<MafRecord>) -> Result<Option<MafRecord>> {
        let record = match record {
            Some(record) => record,
            None => return Ok(None),
        };
        if record.components.is_empty() {
            return Err(self.line_error("Alignment record has no 's' lines"));
        }
        let width = record.text_width();
        for comp in &record.components {
            if comp.text.len() != width {
                return Err(self.line_error(&format!(
                    "Component {} text width {} differs from record width {}",
                    comp.src,
                    comp.text.len(),
                    width
                )));
            }
        }
        Ok(Some(record))
    }

    fn parse_a_line(&self, line: &str) -> Result<MafRecord> {
        let mut record = MafRecord::default();
        for attr in line.split_whitespace().skip(1) {
            let (key, value) = attr
                .split_once('=')
                .ok_or_else(|| self.line_error(&format!("Malformed 'a' attribute: {}", attr)))?;
            let value = value.trim_matches('"');
            match key {
                "score" => record.score = Some(value.parse()?),
                "tree" => record.tree = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(record)
    }

    fn parse_s_line(&self, line: &str) -> Result<MafComp> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (src, start, size, strand, src_size, text) = match &fields[..] {
            ["s", src, start, size, strand, src_size, text] => {
                (*src, *start, *size, *strand, *src_size, *text)
            }
            _ => {
                return Err(self.line_error(&format!(
                    "Expected 7 fields in 's' line, found {}",
                    fields.len()
                )))
            }
        };
        let start: i64 = start
            .parse()
            .map_err(|e| self.line_error(&format!("Invalid start: {}", e)))?;
        let size: i64 = size
            .parse()
            .map_err(|e| self.line_error(&format!("Invalid size: {}", e)))?;
        let strand: Strand = strand
            .parse()
            .map_err(|e| self.line_error(&format!("{}", e)))?;
        let src_size: i64 = src_size
            .parse()
            .map_err(|e| self.line_error(&format!("Invalid srcSize: {}", e)))?;
        if start < 0 || size < 0 || start + size > src_size {
            return Err(self.line_error(&format!(
                "Range {}+{} exceeds source size {} for {}",
                start, size, src_size, src
            )));
        }
        Ok(MafComp {
            src: src.to_string(),
            start,
            size,
            strand,
            src_size,
            text: text.to_string(),
        })
    }

    fn line_error(&self, message: &str) -> crate::error::MafxError {
        crate::mafx_error!("MAF line {}: {}", self.line_number, message)
    }
}
