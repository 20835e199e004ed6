use crate::{
    constants::{MAF_HEADER, MAF_TRAILER},
    io::maf_reader::MafRecord,
    utils::util::Result,
};
use std::io::{BufWriter, Write};

/// Writes MAF records sequentially: header, one paragraph per record, then
/// the trailer. The caller decides record order; this layer only formats.
pub struct MafWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> MafWriter<W> {
    pub fn new(inner: W) -> Self {
        MafWriter {
            writer: BufWriter::new(inner),
        }
    }

    pub fn write_start(&mut self) -> Result<()> {
        writeln!(self.writer, "{}", MAF_HEADER)?;
        writeln!(self.writer)?;
        Ok(())
    }

    pub fn write_record(&mut self, record: &MafRecord) -> Result<()> {
        write!(self.writer, "a")?;
        if let Some(score) = record.score {
            write!(self.writer, " score={}", score)?;
        }
        if let Some(tree) = &record.tree {
            write!(self.writer, " tree=\"{}\"", tree)?;
        }
        writeln!(self.writer)?;

        // Pad the numeric columns so the aligned texts line up, as the
        // standard MAF writers do.
        let src_width = field_width(record, |c| c.src.len());
        let start_width = field_width(record, |c| c.start.to_string().len());
        let size_width = field_width(record, |c| c.size.to_string().len());
        let src_size_width = field_width(record, |c| c.src_size.to_string().len());
        for comp in &record.components {
            writeln!(
                self.writer,
                "s {:<src_w$} {:>start_w$} {:>size_w$} {} {:>src_size_w$} {}",
                comp.src,
                comp.start,
                comp.size,
                comp.strand,
                comp.src_size,
                comp.text,
                src_w = src_width,
                start_w = start_width,
                size_w = size_width,
                src_size_w = src_size_width,
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    pub fn write_end(&mut self) -> Result<()> {
        writeln!(self.writer, "{}", MAF_TRAILER)?;
        self.writer.flush()?;
        Ok(())
    }
}

fn field_width(record: &MafRecord, len: impl Fn(&crate::io::maf_reader::MafComp) -> usize) -> usize {
    record.components.iter().map(len).max().unwrap_or(0)
}
