use crate::utils::util::Result;
use std::fmt;

/// Phylogenetic tree attached to an alignment block. Labels are the
/// `org.seq` names of the block's components. Only the structure needed to
/// round-trip the MAF `tree` attribute and to seed trees for treeless input
/// lives here.
#[derive(Debug, Clone, PartialEq)]
pub struct MafTree {
    root: TreeNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub label: String,
    pub branch_length: Option<f64>,
    pub children: Vec<TreeNode>,
}

impl MafTree {
    /// Parse a newick string, e.g. `(mm39.chr3:0.1,rn7.chr2:0.1)hg38.chr1;`.
    /// The trailing semicolon is optional.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = NewickParser {
            chars: text.trim().trim_end_matches(';').char_indices().peekable(),
            text,
        };
        let root = parser.node()?;
        if let Some((pos, c)) = parser.chars.next() {
            return Err(crate::mafx_error!(
                "Trailing characters in newick tree at offset {}: '{}'",
                pos,
                c
            ));
        }
        Ok(MafTree { root })
    }

    /// Build the default tree for a block without a tree annotation: the last
    /// component is the root and every other component is a direct child at
    /// `default_branch_length`.
    pub fn infer(labels: &[String], default_branch_length: f64) -> Result<Self> {
        let (root_label, child_labels) = labels
            .split_last()
            .ok_or_else(|| crate::mafx_error!("Cannot infer a tree for an empty block"))?;
        let children = child_labels
            .iter()
            .map(|label| TreeNode {
                label: label.clone(),
                branch_length: Some(default_branch_length),
                children: Vec::new(),
            })
            .collect();
        Ok(MafTree {
            root: TreeNode {
                label: root_label.clone(),
                branch_length: None,
                children,
            },
        })
    }

    pub fn root_label(&self) -> &str {
        &self.root.label
    }

    /// Newick text form, with trailing semicolon.
    pub fn format(&self) -> String {
        let mut out = String::new();
        self.root.format_into(&mut out);
        out.push(';');
        out
    }
}

impl fmt::Display for MafTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl TreeNode {
    fn format_into(&self, out: &mut String) {
        if !self.children.is_empty() {
            out.push('(');
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                child.format_into(out);
            }
            out.push(')');
        }
        out.push_str(&self.label);
        if let Some(length) = self.branch_length {
            out.push(':');
            out.push_str(&format_branch_length(length));
        }
    }
}

/// Branch lengths print without trailing zeros so that parse/format round
/// trips are stable.
fn format_branch_length(length: f64) -> String {
    let mut s = format!("{:.6}", length);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.push('0');
    }
    s
}

struct NewickParser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    text: &'a str,
}

impl NewickParser<'_> {
    fn node(&mut self) -> Result<TreeNode> {
        let mut children = Vec::new();
        if matches!(self.chars.peek(), Some((_, '('))) {
            self.chars.next();
            loop {
                children.push(self.node()?);
                match self.chars.next() {
                    Some((_, ',')) => continue,
                    Some((_, ')')) => break,
                    _ => {
                        return Err(crate::mafx_error!(
                            "Unbalanced parentheses in newick tree: {}",
                            self.text
                        ))
                    }
                }
            }
        }
        let label = self.label();
        let branch_length = if matches!(self.chars.peek(), Some((_, ':'))) {
            self.chars.next();
            let token = self.label();
            Some(token.parse::<f64>().map_err(|_| {
                crate::mafx_error!("Invalid branch length '{}' in newick tree", token)
            })?)
        } else {
            None
        };
        Ok(TreeNode {
            label,
            branch_length,
            children,
        })
    }

    fn label(&mut self) -> String {
        let mut label = String::new();
        while let Some((_, c)) = self.chars.peek() {
            if matches!(c, '(' | ')' | ',' | ':' | ';') || c.is_whitespace() {
                break;
            }
            label.push(*c);
            self.chars.next();
        }
        label
    }
}
